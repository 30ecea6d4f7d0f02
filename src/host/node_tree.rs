use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use slab::Slab;

use super::{ImageId, MaterialId, NodeTreeId, TextureId};
use crate::schema::{NodeKind, SocketDecl, SocketType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SocketValue {
    None,
    Rgba([f32; 4]),
    Value(f32),
    Vector([f32; 3]),
}

impl SocketValue {
    pub fn zero(ty: SocketType) -> Self {
        match ty {
            SocketType::Rgba => SocketValue::Rgba([0.5, 0.5, 0.5, 1.0]),
            SocketType::Value => SocketValue::Value(0.5),
            SocketType::Vector => SocketValue::Vector([0.0; 3]),
            SocketType::Shader => SocketValue::None,
        }
    }

    pub fn socket_type(&self) -> Option<SocketType> {
        match self {
            SocketValue::None => None,
            SocketValue::Rgba(_) => Some(SocketType::Rgba),
            SocketValue::Value(_) => Some(SocketType::Value),
            SocketValue::Vector(_) => Some(SocketType::Vector),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSocket {
    pub name: String,
    pub ty: SocketType,
    pub default: SocketValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f32; 2]>,
}

impl NodeSocket {
    pub fn new(name: impl Into<String>, ty: SocketType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: SocketValue::zero(ty),
            range: None,
        }
    }

    fn from_decl(decl: &SocketDecl) -> Self {
        Self::new(decl.name, decl.ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlendType {
    Mix,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorSpace {
    Color,
    /// Raw data, no color management (normal maps).
    None,
}

/// Per-kind node properties. Only the fields meaningful for a node's kind are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<MathOp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend_type: Option<BlendType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_tree: Option<NodeTreeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_space: Option<ColorSpace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_map: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShaderNode {
    pub kind: NodeKind,
    pub name: String,
    pub location: [f32; 2],
    pub inputs: Vec<NodeSocket>,
    pub outputs: Vec<NodeSocket>,
    pub settings: NodeSettings,
}

impl ShaderNode {
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|s| s.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeLink {
    pub from_node: NodeId,
    pub from_socket: usize,
    pub to_node: NodeId,
    pub to_socket: usize,
    pub from_type: SocketType,
    pub to_type: SocketType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TreeUsage {
    /// Embedded in a material.
    Material,
    /// Reusable node group.
    Group,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeTree {
    pub name: String,
    pub usage: TreeUsage,
    /// Interface sockets exposed to group nodes (group inputs).
    pub inputs: Vec<NodeSocket>,
    /// Interface sockets exposed to group nodes (group outputs).
    pub outputs: Vec<NodeSocket>,
    pub nodes: Slab<ShaderNode>,
    pub links: Vec<NodeLink>,
}

impl NodeTree {
    pub fn new(name: impl Into<String>, usage: TreeUsage) -> Self {
        Self {
            name: name.into(),
            usage,
            inputs: Vec::new(),
            outputs: Vec::new(),
            nodes: Slab::new(),
            links: Vec::new(),
        }
    }

    /// Append an interface input; existing group input nodes grow a matching output.
    pub fn add_input(&mut self, socket: NodeSocket) -> usize {
        for (_, node) in self.nodes.iter_mut() {
            if node.kind == NodeKind::GroupInput {
                node.outputs.push(socket.clone());
            }
        }
        self.inputs.push(socket);
        self.inputs.len() - 1
    }

    /// Append an interface output; existing group output nodes grow a matching input.
    pub fn add_output(&mut self, socket: NodeSocket) -> usize {
        for (_, node) in self.nodes.iter_mut() {
            if node.kind == NodeKind::GroupOutput {
                node.inputs.push(socket.clone());
            }
        }
        self.outputs.push(socket);
        self.outputs.len() - 1
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |candidate: &str| self.nodes.iter().any(|(_, n)| n.name == candidate);
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{base}.{i:03}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn insert(&mut self, kind: NodeKind, inputs: Vec<NodeSocket>, outputs: Vec<NodeSocket>) -> NodeId {
        let name = self.unique_name(kind.default_name());
        NodeId(self.nodes.insert(ShaderNode {
            kind,
            name,
            location: [0.0, 0.0],
            inputs,
            outputs,
            settings: NodeSettings::default(),
        }))
    }

    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let (inputs, outputs) = match kind {
            NodeKind::GroupInput => (Vec::new(), self.inputs.clone()),
            NodeKind::GroupOutput => (self.outputs.clone(), Vec::new()),
            _ => (
                kind.inputs().iter().map(NodeSocket::from_decl).collect(),
                kind.outputs().iter().map(NodeSocket::from_decl).collect(),
            ),
        };
        self.insert(kind, inputs, outputs)
    }

    /// Group node instancing `group`; sockets mirror that group's interface.
    pub fn add_group_node(
        &mut self,
        group: NodeTreeId,
        inputs: Vec<NodeSocket>,
        outputs: Vec<NodeSocket>,
    ) -> NodeId {
        let id = self.insert(NodeKind::Group, inputs, outputs);
        self.nodes[id.0].settings.node_tree = Some(group);
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&ShaderNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| anyhow!("node tree '{}' has no node {}", self.name, id.0))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut ShaderNode> {
        let name = &self.name;
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| anyhow!("node tree '{name}' has no node {}", id.0))
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name == name)
            .map(|(key, _)| NodeId(key))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.kind == kind)
            .map(|(key, _)| NodeId(key))
            .collect()
    }

    /// Remove a node together with every link touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<ShaderNode> {
        let node = self.nodes.try_remove(id.0)?;
        self.links
            .retain(|l| l.from_node != id && l.to_node != id);
        Some(node)
    }

    pub fn set_location(&mut self, id: NodeId, location: [f32; 2]) -> Result<()> {
        self.node_mut(id)?.location = location;
        Ok(())
    }

    pub fn set_input_default(&mut self, id: NodeId, socket: usize, value: SocketValue) -> Result<()> {
        let node = self.node_mut(id)?;
        let node_name = node.name.clone();
        let Some(input) = node.inputs.get_mut(socket) else {
            bail!("{node_name} has no input {socket}");
        };
        input.default = value;
        Ok(())
    }

    /// Connect an output to an input. An input holds at most one link; a new link replaces it.
    pub fn link(
        &mut self,
        from_node: NodeId,
        from_socket: usize,
        to_node: NodeId,
        to_socket: usize,
    ) -> Result<()> {
        let from = self.node(from_node)?;
        let from_type = from
            .outputs
            .get(from_socket)
            .map(|s| s.ty)
            .ok_or_else(|| {
                anyhow!(
                    "'{}': {} has no output {from_socket} ({} outputs)",
                    self.name,
                    from.name,
                    from.outputs.len()
                )
            })?;
        let to = self.node(to_node)?;
        let to_type = to.inputs.get(to_socket).map(|s| s.ty).ok_or_else(|| {
            anyhow!(
                "'{}': {} has no input {to_socket} ({} inputs)",
                self.name,
                to.name,
                to.inputs.len()
            )
        })?;

        self.links
            .retain(|l| !(l.to_node == to_node && l.to_socket == to_socket));
        self.links.push(NodeLink {
            from_node,
            from_socket,
            to_node,
            to_socket,
            from_type,
            to_type,
        });
        Ok(())
    }

    pub fn link_into(&self, node: NodeId, socket: usize) -> Option<&NodeLink> {
        self.links
            .iter()
            .find(|l| l.to_node == node && l.to_socket == socket)
    }

    pub fn is_linked(&self, from: (NodeId, usize), to: (NodeId, usize)) -> bool {
        self.link_into(to.0, to.1)
            .is_some_and(|l| l.from_node == from.0 && l.from_socket == from.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_kinds_get_numbered_names() {
        let mut tree = NodeTree::new("t", TreeUsage::Group);
        let a = tree.add_node(NodeKind::MixShader);
        let b = tree.add_node(NodeKind::MixShader);
        assert_eq!(tree.node(a).expect("a").name, "Mix Shader");
        assert_eq!(tree.node(b).expect("b").name, "Mix Shader.001");
        assert_eq!(tree.find_node("Mix Shader.001"), Some(b));
    }

    #[test]
    fn interface_sockets_follow_group_io_nodes() {
        let mut tree = NodeTree::new("t", TreeUsage::Group);
        let input = tree.add_node(NodeKind::GroupInput);
        tree.add_input(NodeSocket::new("Color", SocketType::Rgba));
        tree.add_output(NodeSocket::new("out", SocketType::Shader));
        let output = tree.add_node(NodeKind::GroupOutput);

        assert_eq!(tree.node(input).expect("input").outputs.len(), 1);
        assert_eq!(tree.node(output).expect("output").inputs[0].name, "out");
    }

    #[test]
    fn link_checks_socket_indices_and_replaces_input() {
        let mut tree = NodeTree::new("t", TreeUsage::Material);
        let a = tree.add_node(NodeKind::BsdfDiffuse);
        let b = tree.add_node(NodeKind::BsdfGlossy);
        let out = tree.add_node(NodeKind::MaterialOutput);

        assert!(tree.link(a, 1, out, 0).is_err());
        assert!(tree.link(a, 0, out, 7).is_err());

        tree.link(a, 0, out, 0).expect("link a");
        tree.link(b, 0, out, 0).expect("link b");
        assert_eq!(tree.links.len(), 1);
        assert!(tree.is_linked((b, 0), (out, 0)));
        assert_eq!(tree.links[0].from_type, SocketType::Shader);
    }

    #[test]
    fn removing_a_node_drops_its_links() {
        let mut tree = NodeTree::new("t", TreeUsage::Material);
        let a = tree.add_node(NodeKind::BsdfDiffuse);
        let out = tree.add_node(NodeKind::MaterialOutput);
        tree.link(a, 0, out, 0).expect("link");
        assert!(tree.remove_node(a).is_some());
        assert!(tree.links.is_empty());
        assert!(tree.node(a).is_err());
    }
}
