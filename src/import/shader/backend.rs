use crate::document::Backend;
use crate::schema::NodeKind;

use super::templates::{CYCLES_TEMPLATES, TemplateSpec};

/// What a definition instance wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceShape {
    /// Group node referencing the template named by the definition's `Type`.
    TemplateGroup,
    /// Legacy material node bound to a per-definition profile material.
    MaterialNode,
}

/// Node vocabulary and wiring differences between the two render backends.
#[derive(Debug)]
pub struct BackendProfile {
    pub backend: Backend,
    /// Definition file next to the scene document.
    pub definitions_file: &'static str,
    /// Node created with material nodes, removed before wiring.
    pub starter_node: &'static str,
    pub output_node: &'static str,
    pub instance: InstanceShape,
    pub templates: &'static [TemplateSpec],
    /// Node and output giving the front/back factor.
    pub facing_node: NodeKind,
    pub facing_output: usize,
    pub mix_node: NodeKind,
    pub front_mix_input: usize,
    pub back_mix_input: usize,
    /// Mix alpha outputs too and drive the output node's second input.
    pub alpha_mix: bool,
    /// Texture coordinates go through a +1/-1 offset around the mapping node.
    pub uv_offset: bool,
    /// `Transparency` and literal `Color` act on the profile material.
    pub material_level_params: bool,
}

pub static CYCLES: BackendProfile = BackendProfile {
    backend: Backend::Cycles,
    definitions_file: "materials2.txt",
    starter_node: "Diffuse BSDF",
    output_node: "Material Output",
    instance: InstanceShape::TemplateGroup,
    templates: CYCLES_TEMPLATES,
    facing_node: NodeKind::NewGeometry,
    facing_output: 6,
    mix_node: NodeKind::MixShader,
    front_mix_input: 1,
    back_mix_input: 2,
    alpha_mix: false,
    uv_offset: false,
    material_level_params: false,
};

pub static INTERNAL: BackendProfile = BackendProfile {
    backend: Backend::Internal,
    definitions_file: "materials.txt",
    starter_node: "Material",
    output_node: "Output",
    instance: InstanceShape::MaterialNode,
    templates: &[],
    facing_node: NodeKind::Geometry,
    facing_output: 8,
    mix_node: NodeKind::MixRgb,
    front_mix_input: 2,
    back_mix_input: 1,
    alpha_mix: true,
    uv_offset: true,
    material_level_params: true,
};

impl BackendProfile {
    pub fn for_backend(backend: Backend) -> &'static BackendProfile {
        match backend {
            Backend::Cycles => &CYCLES,
            Backend::Internal => &INTERNAL,
        }
    }
}
