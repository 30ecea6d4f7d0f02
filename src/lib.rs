//! Import of JSON scene exports into a host scene model.
//!
//! - [`document`]: typed view over the exported JSON document.
//! - [`material_defs`]: `key=value` material definition files.
//! - [`host`]: the in-memory host scene the importer writes into.
//! - [`import`]: the import pipeline (meshes, hierarchy, shader graphs, cameras).

pub mod color;
pub mod document;
pub mod error;
pub mod graph;
pub mod host;
pub mod import;
pub mod material_defs;
pub mod schema;

pub use error::{ImportError, ParamWarning};
pub use import::{ImportOptions, ImportReport, import_scene, import_scene_from_path};
