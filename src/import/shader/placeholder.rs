use anyhow::{Context, Result};

use crate::host::{HostScene, MaterialId};
use crate::material_defs::MaterialTable;

use super::super::context::{DefinitionInstance, ImportContext};
use super::super::registry::MaterialKey;
use super::backend::BackendProfile;
use super::instance::definition_instance;

/// Turn a placeholder material into its final node setup: the front definition's group,
/// or front and back groups mixed by facing.
pub fn wire_placeholder(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    profile: &BackendProfile,
    table: &MaterialTable,
    material: MaterialId,
    key: MaterialKey,
) -> Result<()> {
    let front = definition_instance(host, ctx, profile, table, key.front)?;
    let back = match key.back {
        Some(back) => Some(definition_instance(host, ctx, profile, table, back)?),
        None => None,
    };

    let name = match &back {
        Some(back) => format!(
            "{}/{}",
            host.node_tree(front.group).name,
            host.node_tree(back.group).name
        ),
        None => host.node_tree(front.group).name.clone(),
    };
    host.material_mut(material).name = name.clone();

    let tree_id = host.enable_material_nodes(material)?;
    {
        let tree = host.node_tree_mut(tree_id);
        if let Some(starter) = tree.find_node(profile.starter_node) {
            tree.remove_node(starter);
        }
    }
    let output = host
        .node_tree(tree_id)
        .find_node(profile.output_node)
        .with_context(|| format!("material '{name}' has no '{}' node", profile.output_node))?;
    host.node_tree_mut(tree_id).set_location(output, [600.0, 0.0])?;

    let front_node = host.add_group_node(tree_id, front.group);
    host.node_tree_mut(tree_id).set_location(front_node, [0.0, 150.0])?;

    match &back {
        None => host.node_tree_mut(tree_id).link(front_node, 0, output, 0)?,
        Some(back) => {
            let back_node = host.add_group_node(tree_id, back.group);
            let tree = host.node_tree_mut(tree_id);
            tree.set_location(back_node, [0.0, -150.0])?;

            let facing = tree.add_node(profile.facing_node);
            tree.set_location(facing, [0.0, 500.0])?;
            let mix = tree.add_node(profile.mix_node);
            tree.set_location(mix, [350.0, 0.0])?;
            tree.link(facing, profile.facing_output, mix, 0)?;
            tree.link(front_node, 0, mix, profile.front_mix_input)?;
            tree.link(back_node, 0, mix, profile.back_mix_input)?;
            tree.link(mix, 0, output, 0)?;

            if profile.alpha_mix {
                let alpha_mix = tree.add_node(profile.mix_node);
                tree.set_location(alpha_mix, [350.0, -250.0])?;
                tree.link(facing, profile.facing_output, alpha_mix, 0)?;
                tree.link(front_node, 1, alpha_mix, profile.front_mix_input)?;
                tree.link(back_node, 1, alpha_mix, profile.back_mix_input)?;
                tree.link(alpha_mix, 0, output, 1)?;
            }
        }
    }

    if profile.material_level_params {
        for instance in std::iter::once(&front).chain(back.as_ref()) {
            apply_material_level(host, material, instance);
        }
    }

    tracing::debug!(key = %key, material = %name, "wired placeholder material");
    Ok(())
}

/// Carry a definition's transparency and legacy textures over to the placeholder.
fn apply_material_level(host: &mut HostScene, material: MaterialId, instance: &DefinitionInstance) {
    let transparent = instance
        .profile
        .is_some_and(|profile| host.material(profile).use_transparency);
    let target = host.material_mut(material);
    if transparent {
        target.use_transparency = true;
        target.use_cast_shadows = false;
    }
    for texture in &instance.textures {
        if !target.texture_slots.contains(texture) {
            target.texture_slots.push(*texture);
        }
    }
}
