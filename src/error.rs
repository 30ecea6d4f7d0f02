use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Errors that abort an import.
///
/// These travel inside `anyhow::Error`; use `downcast_ref::<ImportError>()` to
/// branch on the kind.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ImportError {
    #[error("host capability missing: {0}")]
    MissingCapability(String),
    #[error("Cannot load image {}", path.display())]
    ResourceLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("mesh {mesh}: {message}")]
    StructuralMismatch { mesh: usize, message: String },
    #[error("mesh index {index} out of range ({len} meshes)")]
    MissingMesh { index: usize, len: usize },
    #[error("definition index {index} out of range ({len} definitions)")]
    MissingDefinition { index: usize, len: usize },
    #[error("cyclic definition reference through definition {0}")]
    CyclicDefinition(usize),
    #[error("material id {id} has no material definition ({len} lines)")]
    MissingMaterialDefinition { id: i32, len: usize },
    #[error("unknown shader group '{0}'")]
    UnknownShaderGroup(String),
}

/// A material parameter that could not be applied. The parameter is skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamWarning {
    pub definition: String,
    pub param: String,
    pub message: String,
}

impl ParamWarning {
    pub fn new(definition: &str, param: &str, message: impl Into<String>) -> Self {
        Self {
            definition: definition.to_string(),
            param: param.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParamWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.definition, self.param, self.message)
    }
}
