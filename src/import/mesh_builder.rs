use std::collections::HashMap;

use anyhow::Result;

use crate::document::{EdgeFlagOptions, MeshRecord};
use crate::error::ImportError;
use crate::host::mesh::{MeshEdge, MeshLoop, MeshPolygon};
use crate::host::{HostScene, Mesh, MeshId};

use super::context::ImportContext;

pub const UV_LAYER_NAME: &str = "UVMap";

/// Geometry buffers for one mesh record plus its (front, back) slot table.
#[derive(Debug, Clone)]
pub struct MeshBuffers {
    pub mesh: Mesh,
    /// Material id pair per slot, in first-use order.
    pub slots: Vec<(i32, i32)>,
}

/// Decode a mesh record. Edges follow polygon traversal and are never shared.
pub fn build_mesh_buffers(
    record: &MeshRecord,
    index: usize,
    flags: EdgeFlagOptions,
) -> Result<MeshBuffers> {
    let mismatch = |message: String| ImportError::StructuralMismatch {
        mesh: index,
        message,
    };

    let vertices = record
        .vertices
        .to_vec3()
        .map_err(|m| mismatch(format!("vertices: {m}")))?;
    let normals = record
        .normals
        .to_vec3()
        .map_err(|m| mismatch(format!("normals: {m}")))?;
    let uvs = record
        .uvs
        .to_vec2()
        .map_err(|m| mismatch(format!("uvs: {m}")))?;

    let polygon_count = record.indices.len();
    if record.materials.len() != polygon_count || record.back_materials.len() != polygon_count {
        return Err(mismatch(format!(
            "{} polygons but {} materials and {} back materials",
            polygon_count,
            record.materials.len(),
            record.back_materials.len()
        ))
        .into());
    }
    let loop_count = record.loop_count();
    if normals.len() != loop_count {
        return Err(mismatch(format!("{} normals for {loop_count} loops", normals.len())).into());
    }
    if uvs.len() != loop_count {
        return Err(mismatch(format!("{} uvs for {loop_count} loops", uvs.len())).into());
    }
    if flags.any() && record.edges.len() != loop_count {
        return Err(mismatch(format!(
            "{} edge flags for {loop_count} edges",
            record.edges.len()
        ))
        .into());
    }

    let mut mesh = Mesh::new("Mesh");
    mesh.vertices = vertices;
    mesh.loops.reserve(loop_count);
    mesh.edges.reserve(loop_count);

    let mut slot_of: HashMap<(i32, i32), u32> = HashMap::new();
    let mut slots = Vec::new();
    for (p, face) in record.indices.iter().enumerate() {
        let pair = (record.materials[p], record.back_materials[p]);
        let material_index = *slot_of.entry(pair).or_insert_with(|| {
            slots.push(pair);
            (slots.len() - 1) as u32
        });

        let loop_start = mesh.loops.len() as u32;
        for (i, &vertex) in face.iter().enumerate() {
            if vertex as usize >= mesh.vertices.len() {
                return Err(mismatch(format!(
                    "polygon {p} references vertex {vertex} of {}",
                    mesh.vertices.len()
                ))
                .into());
            }
            let next = face[(i + 1) % face.len()];
            let edge = mesh.edges.len() as u32;
            mesh.edges.push(MeshEdge {
                vertices: [vertex, next],
                ..MeshEdge::default()
            });
            mesh.loops.push(MeshLoop {
                vertex,
                edge,
                normal: [0.0; 3],
            });
        }
        mesh.polygons.push(MeshPolygon {
            loop_start,
            loop_total: face.len() as u32,
            material_index,
        });
    }

    if flags.any() {
        for (edge, flag) in mesh.edges.iter_mut().zip(&record.edges) {
            let on = *flag == 1;
            if flags.sharp {
                edge.use_edge_sharp = on;
            }
            if flags.freestyle {
                edge.use_freestyle_mark = on;
            }
            if flags.seam {
                edge.use_seam = on;
            }
        }
    }

    mesh.add_uv_layer(UV_LAYER_NAME, uvs).map_err(mismatch)?;
    mesh.set_custom_split_normals(&normals).map_err(mismatch)?;
    mesh.use_auto_smooth = true;

    Ok(MeshBuffers { mesh, slots })
}

/// Build a mesh record into the host, creating placeholder materials for its slots.
pub fn build_mesh(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    record: &MeshRecord,
    index: usize,
) -> Result<MeshId> {
    let MeshBuffers { mut mesh, slots } = build_mesh_buffers(record, index, ctx.edge_flags)?;
    mesh.materials = slots
        .iter()
        .map(|&(front, back)| ctx.materials.get_or_create(host, front, back))
        .collect();
    mesh.validate(false)
        .map_err(|message| ImportError::StructuralMismatch {
            mesh: index,
            message,
        })?;
    tracing::debug!(
        mesh = index,
        polygons = mesh.polygons.len(),
        loops = mesh.loops.len(),
        slots = mesh.materials.len(),
        "built mesh"
    );
    Ok(host.new_mesh(mesh))
}
