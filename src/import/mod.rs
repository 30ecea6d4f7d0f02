//! The import pipeline.
//!
//! Render settings, then meshes, then the node hierarchy, then shader graphs
//! for the placeholder materials the first two stages registered, then
//! cameras. Everything shares one [`ImportContext`]; the first fatal error
//! aborts the import and leaves whatever was already built in the host.

pub mod camera;
pub mod context;
pub mod images;
pub mod instantiate;
pub mod mesh_builder;
pub mod registry;
pub mod settings;
pub mod shader;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::document::{Backend, SceneDocument, load_document_from_path};
use crate::error::ParamWarning;
use crate::host::{HostScene, ObjectId};
use crate::material_defs::MaterialTable;

pub use context::ImportContext;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Directory holding the document's images and material definition files.
    pub source_dir: PathBuf,
    /// Embed image bytes in the host scene.
    pub pack_images: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            pack_images: true,
        }
    }
}

/// Summary of one import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub backend: Backend,
    pub meshes: usize,
    pub objects: usize,
    pub materials: usize,
    pub definitions: usize,
    pub images: usize,
    pub root: ObjectId,
    pub cameras: Vec<ObjectId>,
    pub warnings: Vec<ParamWarning>,
}

pub fn import_scene(
    host: &mut HostScene,
    doc: &SceneDocument,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let backend = doc.options.backend();
    settings::apply_render_options(host, &doc.options)?;

    let mut ctx = ImportContext::new(
        backend,
        doc.options.back_materials,
        doc.options.edge_flags(),
        images::ImageStore::new(&options.source_dir, options.pack_images),
    );
    let objects_before = host.objects.len();

    let meshes = doc
        .meshes
        .iter()
        .enumerate()
        .map(|(index, record)| mesh_builder::build_mesh(host, &mut ctx, record, index))
        .collect::<Result<Vec<_>>>()?;

    let root = instantiate::instantiate_hierarchy(host, &mut ctx, doc, &meshes)?;

    shader::build_templates(host, &mut ctx)?;
    if !ctx.materials.is_empty() {
        let profile = shader::backend::BackendProfile::for_backend(backend);
        let path = options.source_dir.join(profile.definitions_file);
        let table = MaterialTable::load(&path)?;
        shader::wire_materials(host, &mut ctx, &table)?;
    }

    let cameras = camera::build_cameras(host, &doc.views, [doc.options.vp_width, doc.options.vp_height])?;
    settings::apply_units(host, &doc.options);

    let report = ImportReport {
        backend,
        meshes: meshes.len(),
        objects: host.objects.len() - objects_before,
        materials: ctx.materials.len(),
        definitions: ctx.instances.len(),
        images: ctx.images.len(),
        root,
        cameras,
        warnings: ctx.warnings,
    };
    tracing::info!(
        backend = ?report.backend,
        meshes = report.meshes,
        objects = report.objects,
        materials = report.materials,
        cameras = report.cameras.len(),
        warnings = report.warnings.len(),
        "import finished"
    );
    Ok(report)
}

/// Load a document from disk and import it; images and definition files resolve next to it.
pub fn import_scene_from_path(
    host: &mut HostScene,
    path: impl AsRef<Path>,
    pack_images: bool,
) -> Result<ImportReport> {
    let path = path.as_ref();
    let doc = load_document_from_path(path)?;
    let source_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    import_scene(
        host,
        &doc,
        &ImportOptions {
            source_dir,
            pack_images,
        },
    )
    .with_context(|| format!("importing {}", path.display()))
}
