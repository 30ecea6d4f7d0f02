//! Reusable shader groups the path-tracing backend instances per material definition.
//!
//! Each template is plain data: an interface, a node list with editor locations,
//! per-node tweaks, and links as `(from node, from output, to node, to input)`
//! indices into the node list. Building a template validates it as a graph.

use anyhow::{Context, Result, bail};

use crate::graph::{topo_sort, upstream_reachable};
use crate::host::node_tree::{BlendType, MathOp, NodeSocket, SocketValue};
use crate::host::{HostScene, NodeId, NodeTree, NodeTreeId, TreeUsage};
use crate::schema::{NodeKind, SocketType};

use super::super::context::ImportContext;
use super::backend::BackendProfile;

/// Name of the single shader output every template exposes.
pub const TEMPLATE_OUTPUT: &str = "out";

#[derive(Debug, Clone, Copy)]
pub struct TemplateInput {
    pub name: &'static str,
    pub ty: SocketType,
    pub default: SocketValue,
    pub range: Option<[f32; 2]>,
}

#[derive(Debug, Clone, Copy)]
pub enum Tweak {
    Operation(usize, MathOp),
    Blend(usize, BlendType),
    Input(usize, usize, f32),
}

#[derive(Debug)]
pub struct TemplateSpec {
    pub name: &'static str,
    pub inputs: &'static [TemplateInput],
    pub nodes: &'static [(NodeKind, [f32; 2])],
    pub tweaks: &'static [Tweak],
    pub links: &'static [(usize, usize, usize, usize)],
}

const GRAY: f32 = 0.479_320_2;

const fn color(name: &'static str, v: f32) -> TemplateInput {
    TemplateInput {
        name,
        ty: SocketType::Rgba,
        default: SocketValue::Rgba([v, v, v, 1.0]),
        range: None,
    }
}

const fn factor(name: &'static str, v: f32) -> TemplateInput {
    ranged(name, v, 0.0, 1.0)
}

const fn ranged(name: &'static str, v: f32, min: f32, max: f32) -> TemplateInput {
    TemplateInput {
        name,
        ty: SocketType::Value,
        default: SocketValue::Value(v),
        range: Some([min, max]),
    }
}

const fn normal(name: &'static str) -> TemplateInput {
    TemplateInput {
        name,
        ty: SocketType::Vector,
        default: SocketValue::Vector([0.0; 3]),
        range: Some([-1.0, 1.0]),
    }
}

use NodeKind::*;

const SIMPLE_LINKS: &[(usize, usize, usize, usize)] = &[
    (4, 1, 1, 0),
    (1, 0, 2, 0),
    (0, 0, 1, 1),
    (4, 0, 3, 0),
    (4, 2, 3, 1),
    (4, 3, 3, 2),
    (3, 0, 1, 2),
];

const SIMPLE_INPUTS: &[TemplateInput] = &[
    color("Color", GRAY),
    factor("Transparency", 1.0),
    factor("Roughness", 0.0),
    normal("Normal Map"),
];

pub static CYCLES_TEMPLATES: &[TemplateSpec] = &[
    TemplateSpec {
        name: "BlendUpGlossy",
        inputs: SIMPLE_INPUTS,
        nodes: &[
            (BsdfTransparent, [-93.279, 22.7655]),
            (MixShader, [158.4275, -18.00497]),
            (GroupOutput, [392.5263, -23.34586]),
            (BsdfGlossy, [-98.65468, -140.48618]),
            (GroupInput, [-363.06369, -19.83745]),
        ],
        tweaks: &[],
        links: SIMPLE_LINKS,
    },
    TemplateSpec {
        name: "BlendUpDiffuse",
        inputs: SIMPLE_INPUTS,
        nodes: &[
            (BsdfTransparent, [-93.279, 22.7655]),
            (MixShader, [158.4275, -18.00497]),
            (GroupOutput, [392.5263, -23.34586]),
            (BsdfDiffuse, [-98.65468, -140.48618]),
            (GroupInput, [-363.06369, -19.83745]),
        ],
        tweaks: &[],
        links: SIMPLE_LINKS,
    },
    TemplateSpec {
        name: "BlendUpMixDiffuseGlossy",
        inputs: &[
            color("Color", GRAY),
            color("Gloss Color", 0.8),
            factor("Gloss", 0.2),
            factor("Transparency", 1.0),
            factor("Roughness", 0.0),
            normal("Normal"),
        ],
        nodes: &[
            (BsdfGlossy, [-98.08839, -284.52399]),
            (GroupOutput, [479.94244, -22.17881]),
            (BsdfDiffuse, [-98.65468, -140.48618]),
            (MixShader, [104.83004, -196.83014]),
            (GroupInput, [-363.06369, -19.83745]),
            (MixShader, [279.02563, -66.31995]),
            (BsdfTransparent, [97.43166, -9.96961]),
        ],
        tweaks: &[],
        links: &[
            (4, 3, 5, 0),
            (5, 0, 1, 0),
            (6, 0, 5, 1),
            (4, 0, 2, 0),
            (4, 4, 2, 1),
            (4, 5, 2, 2),
            (4, 1, 0, 0),
            (4, 4, 0, 1),
            (3, 0, 5, 2),
            (2, 0, 3, 1),
            (0, 0, 3, 2),
            (4, 2, 3, 0),
        ],
    },
    TemplateSpec {
        name: "BlendUpMixDiffuseGlossy2",
        inputs: &[
            color("Color", 0.8),
            color("Gloss Color", 0.638_271_45),
            factor("Transparency", 1.0),
            factor("Roughness", 0.0),
            factor("Blend", 0.1),
            normal("Normal"),
        ],
        nodes: &[
            (MixShader, [58.88031, -1.11322]),
            (MixShader, [295.30865, 43.30388]),
            (BsdfDiffuse, [-212.71758, 22.63483]),
            (BsdfTransparent, [67.42587, 99.98251]),
            (LayerWeight, [-213.29216, 171.5762]),
            (GroupOutput, [496.98074, 9.52058]),
            (BsdfGlossy, [-216.29189, -123.47525]),
            (GroupInput, [-523.87299, 6.86844]),
        ],
        tweaks: &[],
        links: &[
            (6, 0, 0, 2),
            (4, 1, 0, 0),
            (3, 0, 1, 1),
            (7, 0, 2, 0),
            (2, 0, 0, 1),
            (0, 0, 1, 2),
            (1, 0, 5, 0),
            (7, 2, 1, 0),
            (7, 3, 2, 1),
            (7, 5, 2, 2),
            (7, 3, 6, 1),
            (7, 5, 6, 2),
            (7, 4, 4, 0),
            (7, 5, 4, 1),
            (7, 1, 6, 0),
        ],
    },
    TemplateSpec {
        name: "BlendUpFabric",
        inputs: &[
            color("Color", 1.0),
            factor("Transparency", 1.0),
            factor("Roughness", 0.7),
            factor("Velvet", 0.8),
            factor("Blend", 0.05),
            normal("Normal"),
        ],
        nodes: &[
            (BsdfVelvet, [-106.10822, -137.16693]),
            (BsdfDiffuse, [-114.49026, -294.10876]),
            (BsdfTransparent, [-101.30603, 58.19593]),
            (MixShader, [468.13696, -55.72111]),
            (MixShader, [418.1499, -235.82056]),
            (GroupOutput, [655.24219, -59.36756]),
            (MixShader, [102.14229, -74.29711]),
            (CombineHsv, [-416.46149, -162.48497]),
            (SeparateHsv, [-662.0545, -154.95554]),
            (Math, [-541.99615, -322.18564]),
            (LayerWeight, [134.76453, -201.53487]),
            (BsdfGlossy, [130.19034, -338.11035]),
            (GroupInput, [-854.2901, -1.46319]),
        ],
        tweaks: &[
            Tweak::Operation(9, MathOp::Multiply),
            Tweak::Input(9, 0, 1.2),
        ],
        links: &[
            (2, 0, 3, 1),
            (12, 0, 1, 0),
            (12, 0, 2, 0),
            (12, 1, 3, 0),
            (12, 2, 1, 1),
            (12, 3, 6, 0),
            (12, 5, 1, 2),
            (3, 0, 5, 0),
            (11, 0, 4, 2),
            (6, 0, 4, 1),
            (10, 1, 4, 0),
            (4, 0, 3, 2),
            (12, 0, 8, 0),
            (7, 0, 0, 0),
            (0, 0, 6, 2),
            (1, 0, 6, 1),
            (8, 2, 9, 1),
            (9, 0, 7, 2),
            (8, 1, 7, 1),
            (8, 0, 7, 0),
            (12, 2, 11, 1),
            (12, 5, 11, 2),
            (12, 4, 10, 0),
            (12, 5, 10, 1),
            (12, 5, 0, 2),
        ],
    },
    TemplateSpec {
        name: "BlendUpGlass",
        inputs: &[color("Color", 1.0), factor("Transparency", 0.5)],
        nodes: &[
            (BsdfTransparent, [-0.83595, -84.36238]),
            (MixShader, [-78.04934, 59.87401]),
            (BsdfTransparent, [-344.62946, 56.63876]),
            (BsdfGlossy, [-327.34338, -31.67084]),
            (LightPath, [-65.95743, 397.68124]),
            (MixShader, [211.796, 80.58951]),
            (GroupOutput, [671.59851, 48.432]),
            (MixShader, [474.40582, 70.64628]),
            (BsdfTransparent, [287.77829, -96.5154]),
            (LayerWeight, [-605.16992, 381.77869]),
            (Math, [-373.61792, 246.37042]),
            (GroupInput, [-778.14069, 83.45103]),
        ],
        tweaks: &[
            Tweak::Operation(10, MathOp::Add),
            Tweak::Input(10, 1, 0.075),
        ],
        links: &[
            (4, 1, 5, 0),
            (0, 0, 5, 2),
            (1, 0, 5, 1),
            (2, 0, 1, 1),
            (3, 0, 1, 2),
            (11, 0, 3, 0),
            (11, 0, 2, 0),
            (11, 0, 0, 0),
            (10, 0, 1, 0),
            (9, 1, 10, 0),
            (11, 1, 7, 0),
            (5, 0, 7, 2),
            (7, 0, 6, 0),
            (8, 0, 7, 1),
        ],
    },
    TemplateSpec {
        name: "BlendUpAO",
        inputs: &[
            color("Color", 0.8),
            factor("Strength", 1.0),
            factor("Transparency", 1.0),
            normal("Normal"),
        ],
        nodes: &[
            (BsdfTransparent, [-93.279, 22.7655]),
            (GroupOutput, [614.46399, -21.85307]),
            (MixShader, [158.82533, -100.75478]),
            (MixShader, [382.21704, -30.91553]),
            (AmbientOcclusion, [-91.35117, -300.36948]),
            (Emission, [-89.15873, -168.53525]),
            (GroupInput, [-363.06369, -19.83745]),
        ],
        tweaks: &[],
        links: &[
            (6, 2, 3, 0),
            (3, 0, 1, 0),
            (0, 0, 3, 1),
            (6, 1, 2, 0),
            (6, 0, 5, 0),
            (2, 0, 3, 2),
            (6, 0, 4, 0),
            (4, 0, 2, 2),
            (5, 0, 2, 1),
        ],
    },
    TemplateSpec {
        name: "BlendUpMonochrome",
        inputs: &[
            color("Color", 0.8),
            factor("Direct Shadow", 0.2),
            factor("Transparency", 1.0),
            normal("Normal"),
        ],
        nodes: &[
            (BsdfDiffuse, [-121.84773, -201.34929]),
            (BsdfTransparent, [-91.51011, 129.09932]),
            (GroupOutput, [635.99298, 41.98584]),
            (AmbientOcclusion, [-110.73642, -98.85674]),
            (MixShader, [149.81079, -45.24601]),
            (MixShader, [377.52731, 46.16647]),
            (GroupInput, [-414.78717, 60.56482]),
        ],
        tweaks: &[],
        links: &[
            (6, 0, 3, 0),
            (6, 2, 5, 0),
            (3, 0, 4, 1),
            (0, 0, 4, 2),
            (4, 0, 5, 2),
            (1, 0, 5, 1),
            (5, 0, 2, 0),
            (6, 0, 0, 0),
            (6, 3, 0, 2),
            (6, 1, 4, 0),
        ],
    },
    TemplateSpec {
        name: "BlendUpLight",
        inputs: &[color("Color", 1.0), ranged("Strength", 1.0, 0.0, 1_000_000.0)],
        nodes: &[
            (BsdfTransparent, [-316.57318, -32.83461]),
            (LightPath, [-322.07953, 387.53732]),
            (MixShader, [-67.01492, 147.73645]),
            (GroupOutput, [200.0, 143.97002]),
            (Emission, [-316.32068, 106.69868]),
            (GroupInput, [-655.53912, 87.66108]),
        ],
        tweaks: &[],
        links: &[
            (1, 0, 2, 0),
            (0, 0, 2, 2),
            (4, 0, 2, 1),
            (2, 0, 3, 0),
            (5, 0, 4, 0),
            (5, 1, 4, 1),
        ],
    },
    TemplateSpec {
        name: "BlendUpToon",
        inputs: &[
            color("Color", 0.8),
            factor("Size", 0.5),
            factor("Smooth", 0.0),
            factor("Transparency", 1.0),
            normal("Normal"),
        ],
        nodes: &[
            (GroupOutput, [429.60736, 2.82112]),
            (MixShader, [231.41315, 14.52731]),
            (GroupInput, [-213.65118, 55.83437]),
            (BsdfToon, [8.00787, -115.88106]),
            (BsdfTransparent, [16.74287, 89.4724]),
        ],
        tweaks: &[],
        links: &[
            (2, 0, 3, 0),
            (2, 1, 3, 1),
            (2, 2, 3, 2),
            (2, 4, 3, 3),
            (1, 0, 0, 0),
            (2, 3, 1, 0),
            (4, 0, 1, 1),
            (3, 0, 1, 2),
        ],
    },
    TemplateSpec {
        name: "BlendUpPBR",
        inputs: &[
            color("Albedo", GRAY),
            factor("Transparency", 1.0),
            color("Specular", 0.043_735_03),
            factor("Smoothness", 0.5),
            normal("Normal"),
            color("Occlusion", 1.0),
            ranged("Occlusion Strength", 1.0, 0.0, 10_000.0),
            color("Emission", 0.0),
            ranged("Emission Strength", 1.0, 0.0, 10_000.0),
        ],
        nodes: &[
            (BsdfDiffuse, [-174.95566, 380.47549]),
            (BsdfGlossy, [-90.94093, -41.52636]),
            (SeparateHsv, [-773.29388, -332.97058]),
            (Math, [-552.30743, -566.12231]),
            (Math, [-275.26541, -404.73871]),
            (Math, [-269.20557, -661.11865]),
            (Fresnel, [159.65349, -264.40909]),
            (MixShader, [372.57501, 26.18992]),
            (Emission, [382.98898, -190.98712]),
            (Math, [-32.45287, -566.85706]),
            (CombineHsv, [-507.09036, -307.22235]),
            (MixRgb, [-460.05743, 442.87186]),
            (Math, [-779.44159, 372.64096]),
            (Math, [-447.46997, 97.66339]),
            (GroupInput, [-1017.56848, 13.10022]),
            (AddShader, [601.32983, -89.05664]),
            (BsdfTransparent, [599.45428, 90.07468]),
            (MixShader, [959.89679, 1.54102]),
            (GroupOutput, [1204.25891, -4.17444]),
        ],
        tweaks: &[
            Tweak::Operation(3, MathOp::Power),
            Tweak::Operation(4, MathOp::Add),
            Tweak::Input(4, 1, 1.0),
            Tweak::Operation(5, MathOp::Subtract),
            Tweak::Input(5, 0, 1.0),
            Tweak::Input(10, 2, 1.0),
            Tweak::Blend(11, BlendType::Multiply),
            Tweak::Input(11, 0, 1.0),
            Tweak::Operation(12, MathOp::Power),
            Tweak::Input(12, 1, 0.5),
            Tweak::Operation(13, MathOp::Subtract),
            Tweak::Input(13, 0, 1.0),
            Tweak::Input(13, 1, 1.0),
        ],
        links: &[
            (2, 2, 3, 0),
            (3, 0, 4, 0),
            (4, 0, 9, 0),
            (5, 0, 9, 1),
            (3, 0, 5, 1),
            (2, 0, 10, 0),
            (2, 1, 10, 1),
            (14, 3, 13, 1),
            (0, 0, 7, 1),
            (1, 0, 7, 2),
            (11, 0, 0, 0),
            (6, 0, 7, 0),
            (10, 0, 1, 0),
            (13, 0, 1, 1),
            (13, 0, 0, 1),
            (14, 4, 0, 2),
            (14, 4, 1, 2),
            (14, 4, 6, 1),
            (14, 2, 2, 0),
            (7, 0, 15, 0),
            (8, 0, 15, 1),
            (14, 7, 8, 0),
            (14, 8, 8, 1),
            (9, 0, 6, 0),
            (14, 6, 12, 1),
            (14, 5, 12, 0),
            (14, 0, 11, 2),
            (12, 0, 11, 1),
            (17, 0, 18, 0),
            (14, 1, 17, 0),
            (15, 0, 17, 2),
            (16, 0, 17, 1),
        ],
    },
];

/// Build one template into a standalone node group and check it is a usable shader.
pub fn build_template(spec: &TemplateSpec) -> Result<NodeTree> {
    let mut tree = NodeTree::new(spec.name, TreeUsage::Group);
    for input in spec.inputs {
        tree.add_input(NodeSocket {
            name: input.name.to_string(),
            ty: input.ty,
            default: input.default,
            range: input.range,
        });
    }
    tree.add_output(NodeSocket::new(TEMPLATE_OUTPUT, SocketType::Shader));

    let mut ids = Vec::with_capacity(spec.nodes.len());
    for &(kind, location) in spec.nodes {
        let id = tree.add_node(kind);
        tree.set_location(id, location)?;
        ids.push(id);
    }
    let node = |index: usize| -> Result<NodeId> {
        ids.get(index)
            .copied()
            .with_context(|| format!("'{}' has no node {index}", spec.name))
    };

    for tweak in spec.tweaks {
        match *tweak {
            Tweak::Operation(n, op) => tree.node_mut(node(n)?)?.settings.operation = Some(op),
            Tweak::Blend(n, blend) => tree.node_mut(node(n)?)?.settings.blend_type = Some(blend),
            Tweak::Input(n, socket, v) => {
                tree.set_input_default(node(n)?, socket, SocketValue::Value(v))?
            }
        }
    }
    for &(from, from_socket, to, to_socket) in spec.links {
        tree.link(node(from)?, from_socket, node(to)?, to_socket)?;
    }

    validate_template(&tree)?;
    Ok(tree)
}

/// Acyclic, and the group output is driven from the group input.
fn validate_template(tree: &NodeTree) -> Result<()> {
    topo_sort(tree)?;
    let &[input] = tree.nodes_of_kind(NodeKind::GroupInput).as_slice() else {
        bail!("'{}' needs exactly one group input node", tree.name);
    };
    let &[output] = tree.nodes_of_kind(NodeKind::GroupOutput).as_slice() else {
        bail!("'{}' needs exactly one group output node", tree.name);
    };
    if tree.link_into(output, 0).is_none() {
        bail!("'{}': group output is not connected", tree.name);
    }
    if !upstream_reachable(tree, output).contains(&input) {
        bail!("'{}': group output does not depend on the group inputs", tree.name);
    }
    Ok(())
}

/// Register every template of the backend, reusing groups the host already holds.
pub fn build_templates(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    profile: &BackendProfile,
) -> Result<()> {
    for spec in profile.templates {
        let id: NodeTreeId = match host.find_node_group(spec.name) {
            Some(existing) => existing,
            None => {
                let tree = build_template(spec)
                    .with_context(|| format!("building shader group '{}'", spec.name))?;
                host.new_node_tree(tree)
            }
        };
        ctx.templates.insert(spec.name.to_string(), id);
    }
    tracing::debug!(count = ctx.templates.len(), "shader group templates ready");
    Ok(())
}
