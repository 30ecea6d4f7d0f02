use anyhow::{Context, Result};
use glam::Mat4;

use crate::document::{HierarchyNode, INHERIT_MATERIAL, NodeBody, NodeContent, SceneDocument};
use crate::error::ImportError;
use crate::host::object::Decomposed;
use crate::host::{HostScene, MeshId, ObjectData, ObjectId, SlotLink};

use super::context::ImportContext;

/// The material a node renders with: its own id, or the inherited one when it has none.
pub fn effective_material(own: i32, inherited: i32) -> i32 {
    if own == INHERIT_MATERIAL { inherited } else { own }
}

/// Replace every `-1` component of a slot key with the node's effective material.
/// `None` when the key is fully specified.
pub fn override_pair(front: i32, back: i32, effective: i32) -> Option<(i32, i32)> {
    if front != INHERIT_MATERIAL && back != INHERIT_MATERIAL {
        return None;
    }
    let fill = |id: i32| if id == INHERIT_MATERIAL { effective } else { id };
    Some((fill(front), fill(back)))
}

struct Instantiator<'a> {
    doc: &'a SceneDocument,
    meshes: &'a [MeshId],
    /// Definitions currently being expanded, innermost last.
    expanding: Vec<usize>,
}

/// Instantiate `hierarchy[0]` and everything under it. Returns the root object.
pub fn instantiate_hierarchy(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    doc: &SceneDocument,
    meshes: &[MeshId],
) -> Result<ObjectId> {
    let root = doc.root()?;
    let mut inst = Instantiator {
        doc,
        meshes,
        expanding: Vec::new(),
    };
    inst.node(host, ctx, root, None, INHERIT_MATERIAL)
}

impl Instantiator<'_> {
    fn node(
        &mut self,
        host: &mut HostScene,
        ctx: &mut ImportContext,
        node: &HierarchyNode,
        parent: Option<ObjectId>,
        inherited: i32,
    ) -> Result<ObjectId> {
        let doc = self.doc;
        let material = effective_material(node.material, inherited);

        let (content, definition): (&NodeContent, Option<usize>) = match &node.body {
            NodeBody::Content(content) => (content, None),
            NodeBody::Reference { definition } => {
                if self.expanding.contains(definition) {
                    return Err(ImportError::CyclicDefinition(*definition).into());
                }
                (doc.definition(*definition)?, Some(*definition))
            }
        };

        let data = match content.mesh {
            Some(index) => {
                let mesh = self.meshes.get(index).copied().ok_or(ImportError::MissingMesh {
                    index,
                    len: self.meshes.len(),
                })?;
                ObjectData::Mesh(mesh)
            }
            None => ObjectData::Empty,
        };

        let id = host.new_object(node.name.clone(), data);
        let matrix = Mat4::from_cols_array(&node.matrix);
        {
            let object = host.object_mut(id);
            object.matrix_local = matrix;
            object.decomposed = Some(Decomposed::from_matrix(&matrix));
        }
        if let Some(parent) = parent {
            host.set_parent(id, parent);
        }

        if let ObjectData::Mesh(mesh) = data {
            if material != INHERIT_MATERIAL {
                self.override_slots(host, ctx, id, mesh, material);
            }
        }

        if let Some(definition) = definition {
            self.expanding.push(definition);
        }
        for child in &content.children {
            self.node(host, ctx, child, Some(id), material)
                .with_context(|| format!("in node '{}'", node.name))?;
        }
        if definition.is_some() {
            self.expanding.pop();
        }

        host.link_object(id);
        Ok(id)
    }

    fn override_slots(
        &self,
        host: &mut HostScene,
        ctx: &mut ImportContext,
        object: ObjectId,
        mesh: MeshId,
        material: i32,
    ) {
        let slot_materials = host.mesh(mesh).materials.clone();
        for (slot, mesh_material) in slot_materials.into_iter().enumerate() {
            let Some(key) = ctx.materials.key_of(mesh_material) else {
                continue;
            };
            let back = key.back.unwrap_or(INHERIT_MATERIAL);
            let Some((front, back)) = override_pair(key.front, back, material) else {
                continue;
            };
            let resolved = ctx.materials.get_or_create(host, front, back);
            let s = &mut host.object_mut(object).material_slots[slot];
            s.link = SlotLink::Object;
            s.material = Some(resolved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherit_resolves_to_enclosing_material() {
        assert_eq!(effective_material(-1, 7), 7);
        assert_eq!(effective_material(3, 7), 3);
        assert_eq!(effective_material(-1, -1), -1);
    }

    #[test]
    fn only_placeholder_components_are_overridden() {
        assert_eq!(override_pair(-1, -1, 2), Some((2, 2)));
        assert_eq!(override_pair(0, -1, 2), Some((0, 2)));
        assert_eq!(override_pair(-1, 4, 2), Some((2, 4)));
        assert_eq!(override_pair(1, 4, 2), None);
    }
}
