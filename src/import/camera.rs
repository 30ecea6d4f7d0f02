use anyhow::Result;
use glam::{Mat4, Vec3};

use crate::document::{Projection, View};
use crate::host::{CameraKind, HostScene, ObjectData, ObjectId};

pub const SENSOR_WIDTH: f32 = 32.0;

/// World matrix of an object at `eye` looking at `target`.
///
/// Columns are right = up x forward, true up = forward x right, forward = eye - target,
/// each normalized; translation is `eye`.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let z = (eye - target).normalize();
    let x = up.cross(z).normalize();
    let y = z.cross(x).normalize();
    Mat4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), eye.extend(1.0))
}

/// Camera angle for a vertical field of view in degrees and a viewport size.
pub fn perspective_angle(fov_degrees: f64, width: f64, height: f64) -> f64 {
    let ratio = width / height;
    let fov_y = fov_degrees.to_radians();
    2.0 * ((fov_y * 0.5).tan() * ratio).atan()
}

/// One camera per view. The first view reuses the scene camera when the host has one.
pub fn build_cameras(
    host: &mut HostScene,
    views: &[View],
    viewport: [f32; 2],
) -> Result<Vec<ObjectId>> {
    let mut built = Vec::with_capacity(views.len());
    for (i, view) in views.iter().enumerate() {
        let projection = view.projection()?;

        let reuse = if i == 0 && !host.cameras.is_empty() {
            host.camera
                .and_then(|obj| host.object(obj).camera().map(|cam| (obj, cam)))
        } else {
            None
        };
        let (object, camera) = match reuse {
            Some(pair) => pair,
            None => {
                let camera = host.new_camera(view.name.clone());
                let object = host.new_object(view.name.clone(), ObjectData::Camera(camera));
                host.link_object(object);
                if host.camera.is_none() {
                    host.camera = Some(object);
                }
                (object, camera)
            }
        };

        let data = host.camera_mut(camera);
        match projection {
            Projection::Perspective { fov_degrees } => {
                data.kind = CameraKind::Perspective;
                data.sensor_width = SENSOR_WIDTH;
                data.angle = perspective_angle(
                    f64::from(fov_degrees),
                    f64::from(viewport[0]),
                    f64::from(viewport[1]),
                ) as f32;
            }
            Projection::Orthographic { height } => {
                data.kind = CameraKind::Orthographic;
                data.ortho_scale = height;
            }
        }

        host.object_mut(object).matrix_local = look_at(
            Vec3::from_array(view.eye),
            Vec3::from_array(view.target),
            Vec3::from_array(view.up),
        );
        tracing::debug!(view = %view.name, ?projection, "built camera");
        built.push(object);
    }
    Ok(built)
}
