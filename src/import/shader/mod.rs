//! Shader graph compiler.
//!
//! Material definitions become node groups (template instances on the path
//! tracer, legacy material nodes on the internal renderer) and every
//! placeholder material is rewired to the groups of its front and back ids.

pub mod backend;
pub mod bind;
pub mod instance;
pub mod placeholder;
pub mod templates;
pub mod texture;

use anyhow::{Context, Result};

use crate::host::HostScene;
use crate::material_defs::MaterialTable;

use super::context::ImportContext;
use backend::BackendProfile;

/// Build the shader group templates of the context's backend.
pub fn build_templates(host: &mut HostScene, ctx: &mut ImportContext) -> Result<()> {
    let profile = BackendProfile::for_backend(ctx.backend);
    templates::build_templates(host, ctx, profile)
}

/// Wire every placeholder material, in creation order.
pub fn wire_materials(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    table: &MaterialTable,
) -> Result<()> {
    let profile = BackendProfile::for_backend(ctx.backend);
    let entries = ctx.materials.entries().to_vec();
    for (key, material) in entries {
        placeholder::wire_placeholder(host, ctx, profile, table, material, key)
            .with_context(|| format!("wiring placeholder material '{key}'"))?;
    }
    tracing::info!(
        materials = ctx.materials.len(),
        definitions = ctx.instances.len(),
        "wired materials"
    );
    Ok(())
}
