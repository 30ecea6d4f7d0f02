use anyhow::Result;
use glam::Vec3;

use crate::document::{Backend, Options};
use crate::error::ImportError;
use crate::host::settings::{ComputeDevice, UnitKind, UnitSettings};
use crate::host::{HostScene, ObjectData, RenderEngine, ShadowMethod};

use super::camera::look_at;

pub const SUN_OBJECT: &str = "Sun";

/// Check host capabilities and apply render options. Runs before anything is built.
pub fn apply_render_options(host: &mut HostScene, options: &Options) -> Result<()> {
    let backend = options.backend();
    if backend == Backend::Cycles && !host.capabilities.cycles {
        return Err(ImportError::MissingCapability(
            "Please activate Cycles Render Engine addon".to_string(),
        )
        .into());
    }

    let render = &mut host.render;
    render.engine = match backend {
        Backend::Cycles => RenderEngine::Cycles,
        Backend::Internal => RenderEngine::BlenderRender,
    };
    render.resolution_x = options.vp_width.round().max(1.0) as u32;
    render.resolution_y = options.vp_height.round().max(1.0) as u32;
    render.resolution_percentage = 100;
    if let Some(samples) = options.samples {
        render.samples = samples;
        render.preview_samples = samples;
    }
    render.compute_device = if options.use_gpu {
        ComputeDevice::Cuda
    } else {
        ComputeDevice::Cpu
    };
    if backend == Backend::Internal {
        render.use_environment_light = true;
    }

    if options.shadow {
        orient_sun(host, options.shadow_direction(), backend);
    }
    Ok(())
}

fn orient_sun(host: &mut HostScene, direction: [f32; 3], backend: Backend) {
    let Some(sun) = host.find_object(SUN_OBJECT) else {
        tracing::warn!("shadow requested but the scene has no '{SUN_OBJECT}' object");
        return;
    };
    let target = -Vec3::from_array(direction);
    host.object_mut(sun).matrix_local = look_at(Vec3::ZERO, target, Vec3::Z);
    if backend == Backend::Internal {
        if let ObjectData::Lamp(lamp) = host.object(sun).data {
            host.lamp_mut(lamp).shadow_method = ShadowMethod::RayShadow;
        }
    }
}

/// Hand the exported unit over to the host's unit settings.
pub fn apply_units(host: &mut HostScene, options: &Options) {
    host.render.units = Some(UnitSettings {
        system: if options.unit.is_metric() {
            UnitKind::Metric
        } else {
            UnitKind::Imperial
        },
        source_unit: options.unit,
    });
}
