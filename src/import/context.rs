use std::collections::HashMap;

use crate::document::{Backend, EdgeFlagOptions};
use crate::error::ParamWarning;
use crate::host::{MaterialId, NodeTreeId, TextureId};

use super::images::ImageStore;
use super::registry::EmptyMaterialRegistry;

/// Caches and registries shared by every stage of one import call.
#[derive(Debug)]
pub struct ImportContext {
    pub backend: Backend,
    pub back_materials: bool,
    pub edge_flags: EdgeFlagOptions,
    pub materials: EmptyMaterialRegistry,
    pub images: ImageStore,
    /// Shader group templates by name.
    pub templates: HashMap<String, NodeTreeId>,
    /// Per-definition group instances, keyed by definition line.
    pub instances: HashMap<usize, DefinitionInstance>,
    /// Legacy texture datablocks by image file name.
    pub legacy_textures: HashMap<String, TextureId>,
    pub warnings: Vec<ParamWarning>,
}

/// A material definition compiled into a node group.
#[derive(Debug, Clone)]
pub struct DefinitionInstance {
    pub group: NodeTreeId,
    /// Profile material carrying material-level parameters (legacy backend).
    pub profile: Option<MaterialId>,
    /// Legacy textures the definition samples, for the placeholder's texture slots.
    pub textures: Vec<TextureId>,
}

impl ImportContext {
    pub fn new(
        backend: Backend,
        back_materials: bool,
        edge_flags: EdgeFlagOptions,
        images: ImageStore,
    ) -> Self {
        Self {
            backend,
            back_materials,
            edge_flags,
            materials: EmptyMaterialRegistry::new(back_materials),
            images,
            templates: HashMap::new(),
            instances: HashMap::new(),
            legacy_textures: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: ParamWarning) {
        tracing::warn!(
            definition = %warning.definition,
            param = %warning.param,
            "{}",
            warning.message
        );
        self.warnings.push(warning);
    }
}
