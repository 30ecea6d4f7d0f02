use anyhow::{Context, Result};

use crate::error::{ImportError, ParamWarning};
use crate::host::node_tree::{NodeSocket, SocketValue};
use crate::host::{HostScene, MaterialId, NodeId, NodeTree, NodeTreeId, TreeUsage};
use crate::material_defs::{MaterialTable, ParamValue, TextureKind, parse_param_value};
use crate::schema::{NodeKind, SocketType};

use super::super::context::{DefinitionInstance, ImportContext};
use super::backend::{BackendProfile, InstanceShape};
use super::bind::{Binding, bind_param};
use super::templates::TEMPLATE_OUTPUT;
use super::texture::{SubgraphSite, TextureCache};

const TRANSPARENCY: &str = "Transparency";
const COLOR: &str = "Color";

/// Node group being assembled for one material definition.
struct InstanceState {
    /// Definition name, used in warnings.
    name: String,
    tree: NodeTree,
    /// Node whose inputs receive the definition's parameters.
    target: NodeId,
    output: NodeId,
    site: SubgraphSite,
    textures: TextureCache,
    profile_material: Option<MaterialId>,
    alpha_connected: bool,
}

/// The node group compiled from the definition `material_id` resolves to, built once per
/// definition line.
pub fn definition_instance(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    profile: &BackendProfile,
    table: &MaterialTable,
    material_id: i32,
) -> Result<DefinitionInstance> {
    let (index, def) = table.resolve(material_id)?;
    if let Some(existing) = ctx.instances.get(&index) {
        return Ok(existing.clone());
    }

    let name = match def.name() {
        Some(name) => name.to_string(),
        None => {
            let fallback = format!("Material.{index}");
            ctx.warn(ParamWarning::new(&fallback, "Name", "missing, using a generated name"));
            fallback
        }
    };
    let uv_scale = match def.uv_scale() {
        None => [1.0, 1.0],
        Some(Ok(scale)) => scale,
        Some(Err(message)) => {
            ctx.warn(ParamWarning::new(&name, "UVScale", message));
            [1.0, 1.0]
        }
    };

    let mut state = match profile.instance {
        InstanceShape::TemplateGroup => {
            let ty = def.shader_type().unwrap_or_default();
            let template = *ctx
                .templates
                .get(ty)
                .ok_or_else(|| ImportError::UnknownShaderGroup(ty.to_string()))
                .with_context(|| format!("material definition '{name}'"))?;
            template_group(host, profile, name, template, uv_scale)?
        }
        InstanceShape::MaterialNode => material_node_group(host, profile, name, uv_scale)?,
    };

    for (key, raw) in def.shader_params() {
        apply_param(host, ctx, profile, &mut state, key, raw)
            .with_context(|| format!("material definition '{}', parameter {key}", state.name))?;
    }

    match profile.instance {
        InstanceShape::TemplateGroup => state.tree.link(state.target, 0, state.output, 0)?,
        InstanceShape::MaterialNode if !state.alpha_connected => {
            state.tree.link(state.target, 1, state.output, 1)?
        }
        InstanceShape::MaterialNode => {}
    }

    tracing::debug!(
        definition = %state.name,
        index,
        nodes = state.tree.nodes.len(),
        textures = state.textures.len(),
        "compiled material definition"
    );
    let instance = DefinitionInstance {
        group: host.new_node_tree(state.tree),
        profile: state.profile_material,
        textures: state.textures.legacy,
    };
    ctx.instances.insert(index, instance.clone());
    Ok(instance)
}

fn template_group(
    host: &HostScene,
    profile: &BackendProfile,
    name: String,
    template: NodeTreeId,
    uv_scale: [f32; 2],
) -> Result<InstanceState> {
    let mut tree = NodeTree::new(name.clone(), TreeUsage::Group);
    tree.add_output(NodeSocket::new(TEMPLATE_OUTPUT, SocketType::Shader));
    let source = host.node_tree(template);
    let target = tree.add_group_node(template, source.inputs.clone(), source.outputs.clone());
    tree.set_location(target, [0.0, 150.0])?;
    let output = tree.add_node(NodeKind::GroupOutput);
    tree.set_location(output, [200.0, 150.0])?;

    Ok(InstanceState {
        name,
        tree,
        target,
        output,
        site: SubgraphSite::new(profile, uv_scale, None),
        textures: TextureCache::default(),
        profile_material: None,
        alpha_connected: false,
    })
}

fn material_node_group(
    host: &mut HostScene,
    profile: &BackendProfile,
    name: String,
    uv_scale: [f32; 2],
) -> Result<InstanceState> {
    let mut tree = NodeTree::new(name.clone(), TreeUsage::Group);
    tree.add_output(NodeSocket::new("Color", SocketType::Rgba));
    tree.add_output(NodeSocket::new("Alpha", SocketType::Value));
    let output = tree.add_node(NodeKind::GroupOutput);
    tree.set_location(output, [200.0, 150.0])?;

    let material = host.new_material(format!("{name}_profile"));
    let target = tree.add_node(NodeKind::Material);
    tree.set_location(target, [0.0, 150.0])?;
    tree.node_mut(target)?.settings.material = Some(material);

    let geometry = tree.add_node(NodeKind::Geometry);
    tree.set_location(geometry, [-900.0, -200.0])?;
    tree.link(geometry, 5, target, 3)?;
    tree.link(target, 0, output, 0)?;

    Ok(InstanceState {
        name,
        tree,
        target,
        output,
        site: SubgraphSite::new(profile, uv_scale, Some(geometry)),
        textures: TextureCache::default(),
        profile_material: Some(material),
        alpha_connected: false,
    })
}

fn apply_param(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    profile: &BackendProfile,
    state: &mut InstanceState,
    key: &str,
    raw: &str,
) -> Result<()> {
    let value = parse_param_value(raw);

    if profile.material_level_params && key == TRANSPARENCY {
        return apply_transparency(host, ctx, state, &value);
    }

    let target = state.tree.node(state.target)?;
    let Some(socket) = target.input_index(key) else {
        let message = format!("no input named '{key}' on {}", target.name);
        ctx.warn(ParamWarning::new(&state.name, key, message));
        return Ok(());
    };
    let ty = target.inputs[socket].ty;

    let binding = match bind_param(ty, &value) {
        Ok(binding) => binding,
        Err(message) => {
            ctx.warn(ParamWarning::new(&state.name, key, message));
            return Ok(());
        }
    };

    match binding {
        Binding::Literal(SocketValue::Rgba([r, g, b, _])) if profile.material_level_params && key == COLOR => {
            if let Some(material) = state.profile_material {
                host.material_mut(material).diffuse_color = [r, g, b];
            }
        }
        Binding::Literal(value) => state.tree.set_input_default(state.target, socket, value)?,
        Binding::Texture { kind, file } => {
            let (node, out) =
                state
                    .textures
                    .output(host, ctx, &mut state.tree, state.site, kind, &file)?;
            state.tree.link(node, out, state.target, socket)?;
            if profile.material_level_params && kind == TextureKind::Color {
                let (node, alpha) = state.textures.output(
                    host,
                    ctx,
                    &mut state.tree,
                    state.site,
                    TextureKind::Alpha,
                    &file,
                )?;
                state.tree.link(node, alpha, state.output, 1)?;
                state.alpha_connected = true;
            }
        }
    }
    Ok(())
}

/// Material-level transparency: a literal alpha on the profile material, or a texture alpha
/// driving the group's `Alpha` output.
fn apply_transparency(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    state: &mut InstanceState,
    value: &ParamValue,
) -> Result<()> {
    let binding = match bind_param(SocketType::Value, value) {
        Ok(binding) => binding,
        Err(message) => {
            ctx.warn(ParamWarning::new(&state.name, TRANSPARENCY, message));
            return Ok(());
        }
    };
    let Some(material) = state.profile_material else {
        return Ok(());
    };
    host.material_mut(material).use_transparency = true;
    match binding {
        Binding::Literal(SocketValue::Value(alpha)) => host.material_mut(material).alpha = alpha,
        Binding::Literal(_) => {}
        Binding::Texture { kind, file } => {
            let (node, alpha) =
                state
                    .textures
                    .output(host, ctx, &mut state.tree, state.site, kind, &file)?;
            state.tree.link(node, alpha, state.output, 1)?;
            state.alpha_connected = true;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Backend, EdgeFlagOptions};
    use crate::host::{HostCapabilities, RenderEngine};
    use crate::import::images::ImageStore;
    use crate::import::shader::backend::{CYCLES, INTERNAL};
    use crate::import::shader::templates::build_templates;

    fn setup(backend: Backend) -> (tempfile::TempDir, HostScene, ImportContext) {
        let dir = tempfile::tempdir().expect("tempdir");
        image::RgbaImage::new(2, 2)
            .save(dir.path().join("wood.png"))
            .expect("write png");
        let mut host = HostScene::empty(HostCapabilities::default());
        host.render.engine = match backend {
            Backend::Cycles => RenderEngine::Cycles,
            Backend::Internal => RenderEngine::BlenderRender,
        };
        let mut ctx = ImportContext::new(
            backend,
            false,
            EdgeFlagOptions::default(),
            ImageStore::new(dir.path(), false),
        );
        let profile = BackendProfile::for_backend(backend);
        build_templates(&mut host, &mut ctx, profile).expect("templates");
        (dir, host, ctx)
    }

    #[test]
    fn template_instance_binds_literals_and_warns_on_unknown_inputs() {
        let (_dir, mut host, mut ctx) = setup(Backend::Cycles);
        let table = MaterialTable::parse(
            "\nName=Red;Type=BlendUpDiffuse;Color=Color(255,0,0);Roughness=0.3;Sheen=1",
        );
        let inst = definition_instance(&mut host, &mut ctx, &CYCLES, &table, 0).expect("instance");

        let tree = host.node_tree(inst.group);
        assert_eq!(tree.name, "Red");
        assert_eq!(tree.outputs[0].name, "out");
        let group = tree.nodes_of_kind(NodeKind::Group)[0];
        let output = tree.nodes_of_kind(NodeKind::GroupOutput)[0];
        assert!(tree.is_linked((group, 0), (output, 0)));

        let node = tree.node(group).expect("group node");
        let SocketValue::Rgba([r, g, _, _]) = node.inputs[0].default else {
            panic!("color input should be rgba");
        };
        assert!((r - 1.0).abs() < 1e-6 && g == 0.0);
        assert_eq!(node.inputs[2].default, SocketValue::Value(0.3));

        assert_eq!(ctx.warnings.len(), 1);
        assert_eq!(ctx.warnings[0].param, "Sheen");
    }

    #[test]
    fn instances_are_memoized_per_definition_line() {
        let (_dir, mut host, mut ctx) = setup(Backend::Cycles);
        let table = MaterialTable::parse("\nName=A;Type=BlendUpGlossy");
        let a = definition_instance(&mut host, &mut ctx, &CYCLES, &table, 0).expect("a");
        let trees = host.node_trees.len();
        let again = definition_instance(&mut host, &mut ctx, &CYCLES, &table, 0).expect("again");
        assert_eq!(a.group, again.group);
        assert_eq!(host.node_trees.len(), trees);
    }

    #[test]
    fn unknown_or_missing_type_is_fatal() {
        let (_dir, mut host, mut ctx) = setup(Backend::Cycles);
        let table = MaterialTable::parse("\nName=A;Type=Nope\nName=B");
        for id in [0, 1] {
            let err = definition_instance(&mut host, &mut ctx, &CYCLES, &table, id)
                .expect_err("unknown type");
            assert!(matches!(
                err.downcast_ref::<ImportError>(),
                Some(ImportError::UnknownShaderGroup(_))
            ));
        }
    }

    #[test]
    fn textures_share_a_subgraph_inside_one_instance() {
        let (_dir, mut host, mut ctx) = setup(Backend::Cycles);
        let table = MaterialTable::parse(
            "\nName=Wood;Type=BlendUpDiffuse;UVScale=(2,4);Color=TextureColor(wood.png);Transparency=TextureAlpha(wood.png)",
        );
        let inst = definition_instance(&mut host, &mut ctx, &CYCLES, &table, 0).expect("instance");
        let tree = host.node_tree(inst.group);
        let tex = tree.nodes_of_kind(NodeKind::TexImage);
        assert_eq!(tex.len(), 1);
        let group = tree.nodes_of_kind(NodeKind::Group)[0];
        assert!(tree.is_linked((tex[0], 0), (group, 0)));
        assert!(tree.is_linked((tex[0], 1), (group, 1)));
        let mapping = tree.nodes_of_kind(NodeKind::Mapping)[0];
        assert_eq!(tree.node(mapping).expect("mapping").settings.scale, Some([2.0, 4.0, 1.0]));
    }

    #[test]
    fn bad_uv_scale_warns_and_falls_back() {
        let (_dir, mut host, mut ctx) = setup(Backend::Cycles);
        let table = MaterialTable::parse(
            "\nName=Wood;Type=BlendUpDiffuse;UVScale=(2);Color=TextureColor(wood.png)",
        );
        let inst = definition_instance(&mut host, &mut ctx, &CYCLES, &table, 0).expect("instance");
        let tree = host.node_tree(inst.group);
        let mapping = tree.nodes_of_kind(NodeKind::Mapping)[0];
        assert_eq!(tree.node(mapping).expect("mapping").settings.scale, Some([1.0, 1.0, 1.0]));
        assert_eq!(ctx.warnings[0].param, "UVScale");
    }

    #[test]
    fn legacy_transparency_and_color_act_on_the_profile_material() {
        let (_dir, mut host, mut ctx) = setup(Backend::Internal);
        let table = MaterialTable::parse("\nName=Glass;Color=Color(0,0,0);Transparency=0.25;Refl=0.5");
        let inst = definition_instance(&mut host, &mut ctx, &INTERNAL, &table, 0).expect("instance");

        let profile = inst.profile.expect("profile material");
        let material = host.material(profile);
        assert_eq!(material.name, "Glass_profile");
        assert!(material.use_transparency);
        assert_eq!(material.alpha, 0.25);
        assert_eq!(material.diffuse_color, [0.0, 0.0, 0.0]);

        let tree = host.node_tree(inst.group);
        let mat = tree.nodes_of_kind(NodeKind::Material)[0];
        let output = tree.nodes_of_kind(NodeKind::GroupOutput)[0];
        let geometry = tree.nodes_of_kind(NodeKind::Geometry)[0];
        assert!(tree.is_linked((mat, 0), (output, 0)));
        assert!(tree.is_linked((mat, 1), (output, 1)));
        assert!(tree.is_linked((geometry, 5), (mat, 3)));
        assert_eq!(tree.node(mat).expect("mat").inputs[2].default, SocketValue::Value(0.5));
    }

    #[test]
    fn legacy_texture_color_drives_the_alpha_output() {
        let (_dir, mut host, mut ctx) = setup(Backend::Internal);
        let table = MaterialTable::parse("\nName=Wood;Color=TextureColor(wood.png)");
        let inst = definition_instance(&mut host, &mut ctx, &INTERNAL, &table, 0).expect("instance");
        assert_eq!(inst.textures.len(), 1);

        let tree = host.node_tree(inst.group);
        let tex = tree.nodes_of_kind(NodeKind::Texture)[0];
        let mat = tree.nodes_of_kind(NodeKind::Material)[0];
        let output = tree.nodes_of_kind(NodeKind::GroupOutput)[0];
        assert!(tree.is_linked((tex, 1), (mat, 0)));
        assert!(tree.is_linked((tex, 0), (output, 1)));
    }
}
