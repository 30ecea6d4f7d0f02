use serde::Serialize;

use crate::document::UnitSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenderEngine {
    BlenderRender,
    Cycles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComputeDevice {
    Cpu,
    Cuda,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitKind {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitSettings {
    pub system: UnitKind,
    /// Unit as exported; presets derived from it are left to the host.
    pub source_unit: UnitSystem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSettings {
    pub engine: RenderEngine,
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub resolution_percentage: u32,
    pub samples: u32,
    pub preview_samples: u32,
    pub compute_device: ComputeDevice,
    /// World environment lighting (legacy internal renderer).
    pub use_environment_light: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitSettings>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            engine: RenderEngine::BlenderRender,
            resolution_x: 1920,
            resolution_y: 1080,
            resolution_percentage: 50,
            samples: 128,
            preview_samples: 32,
            compute_device: ComputeDevice::Cpu,
            use_environment_light: false,
            units: None,
        }
    }
}

/// What the running host can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostCapabilities {
    /// Node-based path tracer is installed and enabled.
    pub cycles: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self { cycles: true }
    }
}
