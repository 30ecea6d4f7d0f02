use blendup_import::document::parse_document;
use blendup_import::host::{CameraKind, HostCapabilities, HostScene, ObjectId};
use blendup_import::import::camera::{SENSOR_WIDTH, build_cameras};
use blendup_import::{ImportOptions, import_scene};
use glam::Vec3;
use serde_json::{Value, json};

fn document(views: Value) -> blendup_import::document::SceneDocument {
    parse_document(
        &json!({
            "options": { "rendering": "Blender Render", "vpWidth": 1920, "vpHeight": 1080 },
            "hierarchy": [{ "name": "root", "material": -1 }],
            "views": views
        })
        .to_string(),
    )
    .unwrap()
}

fn perspective(name: &str, fov: f32) -> Value {
    json!({ "name": name, "mode": "perspective", "fov": fov, "eye": [0, -10, 0], "target": [0, 0, 0], "up": [0, 0, 1] })
}

fn camera_of(host: &HostScene, object: ObjectId) -> &blendup_import::host::CameraData {
    host.camera(host.object(object).camera().unwrap())
}

#[test]
fn first_view_reuses_the_scene_camera() {
    let doc = document(json!([perspective("Front", 50.0), perspective("Side", 40.0)]));
    let mut host = HostScene::startup(HostCapabilities::default());
    let startup_camera = host.camera.unwrap();
    let cameras_before = host.cameras.len();

    let report = import_scene(&mut host, &doc, &ImportOptions::default()).unwrap();

    assert_eq!(report.cameras.len(), 2);
    assert_eq!(report.cameras[0], startup_camera);
    assert_ne!(report.cameras[1], startup_camera);
    assert_eq!(host.cameras.len(), cameras_before + 1);
    assert_eq!(host.camera, Some(startup_camera));
    assert_eq!(host.object(report.cameras[1]).name, "Side");
    assert!(host.scene_objects.contains(&report.cameras[1]));
}

#[test]
fn perspective_angle_follows_the_viewport_aspect() {
    let doc = document(json!([perspective("Front", 50.0)]));
    let mut host = HostScene::startup(HostCapabilities::default());
    let report = import_scene(&mut host, &doc, &ImportOptions::default()).unwrap();

    let camera = camera_of(&host, report.cameras[0]);
    let expected = 2.0 * ((25f64).to_radians().tan() * 1920.0 / 1080.0).atan();
    assert_eq!(camera.kind, CameraKind::Perspective);
    assert_eq!(camera.sensor_width, SENSOR_WIDTH);
    assert!((f64::from(camera.angle) - expected).abs() < 1e-6, "got {}", camera.angle);
}

#[test]
fn orthographic_view_sets_ortho_scale() {
    let doc = document(json!([{
        "name": "Top", "mode": "orthographic", "orthoHeight": 12.5,
        "eye": [0, 0, 10], "target": [0, 0, 0], "up": [0, 1, 0]
    }]));
    let mut host = HostScene::startup(HostCapabilities::default());
    let report = import_scene(&mut host, &doc, &ImportOptions::default()).unwrap();

    let camera = camera_of(&host, report.cameras[0]);
    assert_eq!(camera.kind, CameraKind::Orthographic);
    assert_eq!(camera.ortho_scale, 12.5);
}

#[test]
fn camera_transform_is_a_look_at() {
    let doc = document(json!([perspective("Front", 50.0)]));
    let mut host = HostScene::startup(HostCapabilities::default());
    let report = import_scene(&mut host, &doc, &ImportOptions::default()).unwrap();

    let m = host.object(report.cameras[0]).matrix_local;
    assert_eq!(m.w_axis.truncate(), Vec3::new(0.0, -10.0, 0.0));
    assert!((m.z_axis.truncate() - Vec3::NEG_Y).length() < 1e-6);
    assert!((m.x_axis.truncate() - Vec3::X).length() < 1e-6);
    assert!((m.y_axis.truncate() - Vec3::Z).length() < 1e-6);
}

#[test]
fn empty_scene_creates_its_first_camera() {
    let doc = document(json!([perspective("Only", 50.0)]));
    let mut host = HostScene::empty(HostCapabilities::default());
    let built = build_cameras(&mut host, &doc.views, [1920.0, 1080.0]).unwrap();
    assert_eq!(built.len(), 1);
    assert_eq!(host.cameras.len(), 1);
    assert_eq!(host.camera, Some(built[0]));
}

#[test]
fn perspective_view_without_fov_is_an_error() {
    let doc = document(json!([{
        "name": "Broken", "mode": "perspective",
        "eye": [0, 0, 1], "target": [0, 0, 0], "up": [0, 1, 0]
    }]));
    let mut host = HostScene::startup(HostCapabilities::default());
    assert!(import_scene(&mut host, &doc, &ImportOptions::default()).is_err());
}
