use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ImportError;

/// Material id meaning "inherit from the enclosing node".
pub const INHERIT_MATERIAL: i32 = -1;

/// Backend name that selects the node-based path tracer.
pub const CYCLES_RENDERING: &str = "Blender Cycles";

#[derive(Debug, Clone, Deserialize)]
pub struct SceneDocument {
    pub options: Options,
    #[serde(default)]
    pub meshes: Vec<MeshRecord>,
    pub hierarchy: Vec<HierarchyNode>,
    #[serde(default)]
    pub definitions: Vec<NodeContent>,
    #[serde(default)]
    pub views: Vec<View>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Backend {
    /// Legacy internal renderer: material nodes, UV offset quirk, material-level alpha.
    Internal,
    /// Node-based path tracer: shader group templates, facing shader mix.
    Cycles,
}

impl Backend {
    pub fn from_rendering_name(name: &str) -> Self {
        if name == CYCLES_RENDERING {
            Backend::Cycles
        } else {
            Backend::Internal
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "i")]
    Inches,
    #[serde(rename = "f")]
    Feet,
}

impl UnitSystem {
    pub fn is_metric(self) -> bool {
        matches!(
            self,
            UnitSystem::Meters | UnitSystem::Centimeters | UnitSystem::Millimeters
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub rendering: String,
    #[serde(default, deserialize_with = "flag")]
    pub shadow: bool,
    #[serde(rename = "shadowX", default)]
    pub shadow_x: f32,
    #[serde(rename = "shadowY", default)]
    pub shadow_y: f32,
    #[serde(rename = "shadowZ", default)]
    pub shadow_z: f32,
    #[serde(rename = "vpWidth")]
    pub vp_width: f32,
    #[serde(rename = "vpHeight")]
    pub vp_height: f32,
    #[serde(default)]
    pub samples: Option<u32>,
    #[serde(default)]
    pub unit: UnitSystem,
    #[serde(default, deserialize_with = "flag")]
    pub back_materials: bool,
    #[serde(default, deserialize_with = "flag")]
    pub use_sharp_edge: bool,
    #[serde(default, deserialize_with = "flag")]
    pub use_seam: bool,
    #[serde(default, deserialize_with = "flag")]
    pub use_freestyle_mark: bool,
    #[serde(rename = "useGPU", default, deserialize_with = "flag")]
    pub use_gpu: bool,
}

impl Options {
    pub fn backend(&self) -> Backend {
        Backend::from_rendering_name(&self.rendering)
    }

    pub fn shadow_direction(&self) -> [f32; 3] {
        [self.shadow_x, self.shadow_y, self.shadow_z]
    }

    pub fn edge_flags(&self) -> EdgeFlagOptions {
        EdgeFlagOptions {
            sharp: self.use_sharp_edge,
            seam: self.use_seam,
            freestyle: self.use_freestyle_mark,
        }
    }
}

/// Which edge attributes receive the per-edge 0/1 flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeFlagOptions {
    pub sharp: bool,
    pub seam: bool,
    pub freestyle: bool,
}

impl EdgeFlagOptions {
    pub fn any(self) -> bool {
        self.sharp || self.seam || self.freestyle
    }
}

/// 0/1 integers (as exported) or JSON booleans.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        serde_json::Value::Null => Ok(false),
        other => Err(D::Error::custom(format!("expected 0/1 flag, got {other}"))),
    }
}

/// A vector attribute stored either flat (`[x, y, z, x, y, z]`) or nested (`[[x, y, z]]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VectorList {
    Nested(Vec<Vec<f32>>),
    Flat(Vec<f32>),
}

impl Default for VectorList {
    fn default() -> Self {
        VectorList::Flat(Vec::new())
    }
}

impl VectorList {
    pub fn to_vec2(&self) -> std::result::Result<Vec<[f32; 2]>, String> {
        self.to_arrays::<2>()
    }

    pub fn to_vec3(&self) -> std::result::Result<Vec<[f32; 3]>, String> {
        self.to_arrays::<3>()
    }

    fn to_arrays<const N: usize>(&self) -> std::result::Result<Vec<[f32; N]>, String> {
        match self {
            VectorList::Flat(values) => {
                if values.len() % N != 0 {
                    return Err(format!(
                        "flat array of {} floats is not a multiple of {N}",
                        values.len()
                    ));
                }
                Ok(values
                    .chunks_exact(N)
                    .map(|c| std::array::from_fn(|i| c[i]))
                    .collect())
            }
            VectorList::Nested(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    <[f32; N]>::try_from(item.as_slice()).map_err(|_| {
                        format!("element {i} has {} components, expected {N}", item.len())
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeshRecord {
    pub vertices: VectorList,
    pub indices: Vec<Vec<u32>>,
    pub normals: VectorList,
    #[serde(default)]
    pub edges: Vec<u8>,
    pub materials: Vec<i32>,
    #[serde(rename = "backMaterials")]
    pub back_materials: Vec<i32>,
    pub uvs: VectorList,
}

impl MeshRecord {
    pub fn loop_count(&self) -> usize {
        self.indices.iter().map(Vec::len).sum()
    }
}

/// Mesh and children carried by a hierarchy node or a shared definition.
#[derive(Debug, Clone, Default)]
pub struct NodeContent {
    pub mesh: Option<usize>,
    pub children: Vec<HierarchyNode>,
}

impl NodeContent {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum NodeBody {
    Content(NodeContent),
    /// Mesh and children come from `definitions[definition]`.
    Reference { definition: usize },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawHierarchyNode")]
pub struct HierarchyNode {
    pub name: String,
    /// Column-major: translation lives in elements 12..14.
    pub matrix: [f32; 16],
    pub material: i32,
    pub body: NodeBody,
}

#[derive(Debug, Clone, Deserialize)]
struct RawHierarchyNode {
    #[serde(default)]
    name: String,
    #[serde(default = "identity_matrix")]
    matrix: [f32; 16],
    #[serde(default = "inherit_material")]
    material: i32,
    #[serde(default)]
    mesh: Option<usize>,
    #[serde(default)]
    definition: Option<usize>,
    #[serde(default)]
    children: Vec<RawHierarchyNode>,
}

fn identity_matrix() -> [f32; 16] {
    glam::Mat4::IDENTITY.to_cols_array()
}

fn inherit_material() -> i32 {
    INHERIT_MATERIAL
}

impl From<RawHierarchyNode> for HierarchyNode {
    fn from(raw: RawHierarchyNode) -> Self {
        let body = match raw.definition {
            Some(definition) => NodeBody::Reference { definition },
            None => NodeBody::Content(NodeContent {
                mesh: raw.mesh,
                children: raw.children.into_iter().map(HierarchyNode::from).collect(),
            }),
        };
        Self {
            name: raw.name,
            matrix: raw.matrix,
            material: raw.material,
            body,
        }
    }
}

impl<'de> Deserialize<'de> for NodeContent {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Definitions share the node layout; only mesh and children matter.
        let raw = RawHierarchyNode::deserialize(deserializer)?;
        Ok(NodeContent {
            mesh: raw.mesh,
            children: raw.children.into_iter().map(HierarchyNode::from).collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective { fov_degrees: f32 },
    Orthographic { height: f32 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct View {
    #[serde(default)]
    pub name: String,
    pub mode: String,
    #[serde(default)]
    pub fov: Option<f32>,
    #[serde(rename = "orthoHeight", default)]
    pub ortho_height: Option<f32>,
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
}

impl View {
    pub fn projection(&self) -> Result<Projection> {
        if self.mode == "perspective" {
            let fov_degrees = self
                .fov
                .ok_or_else(|| anyhow!("view '{}' is perspective but has no fov", self.name))?;
            Ok(Projection::Perspective { fov_degrees })
        } else {
            let height = self.ortho_height.ok_or_else(|| {
                anyhow!("view '{}' is orthographic but has no orthoHeight", self.name)
            })?;
            Ok(Projection::Orthographic { height })
        }
    }
}

impl SceneDocument {
    pub fn root(&self) -> Result<&HierarchyNode> {
        self.hierarchy
            .first()
            .ok_or_else(|| anyhow!("document hierarchy is empty"))
    }

    pub fn definition(&self, index: usize) -> Result<&NodeContent> {
        self.definitions.get(index).ok_or_else(|| {
            ImportError::MissingDefinition {
                index,
                len: self.definitions.len(),
            }
            .into()
        })
    }

    pub fn mesh(&self, index: usize) -> Result<&MeshRecord> {
        self.meshes.get(index).ok_or_else(|| {
            ImportError::MissingMesh {
                index,
                len: self.meshes.len(),
            }
            .into()
        })
    }
}

pub fn parse_document(text: &str) -> Result<SceneDocument> {
    serde_json::from_str(text).context("parse scene document JSON")
}

pub fn load_document_from_path(path: impl AsRef<Path>) -> Result<SceneDocument> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene document {}", path.display()))?;
    parse_document(&text).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> serde_json::Value {
        json!({ "rendering": "Blender Cycles", "vpWidth": 800, "vpHeight": 600, "back_materials": 1 })
    }

    #[test]
    fn rendering_name_selects_backend() {
        assert_eq!(Backend::from_rendering_name("Blender Cycles"), Backend::Cycles);
        assert_eq!(Backend::from_rendering_name("Blender Render"), Backend::Internal);
        assert_eq!(Backend::from_rendering_name(""), Backend::Internal);
    }

    #[test]
    fn flags_accept_ints_and_bools() {
        let o: Options = serde_json::from_value(json!({
            "vpWidth": 1, "vpHeight": 1, "shadow": true, "use_seam": 0, "useGPU": 1
        }))
        .expect("options");
        assert!(o.shadow);
        assert!(!o.use_seam);
        assert!(o.use_gpu);
        assert_eq!(o.unit, UnitSystem::Meters);
    }

    #[test]
    fn reference_node_becomes_tagged_body() {
        let doc = parse_document(
            &json!({
                "options": options(),
                "hierarchy": [{
                    "name": "root", "material": -1,
                    "children": [{ "name": "inst", "material": 3, "definition": 0 }]
                }],
                "definitions": [{ "mesh": 0 }]
            })
            .to_string(),
        )
        .expect("parse");

        let root = doc.root().expect("root");
        let NodeBody::Content(content) = &root.body else {
            panic!("root should carry content");
        };
        assert_eq!(content.mesh, None);
        assert!(matches!(
            content.children[0].body,
            NodeBody::Reference { definition: 0 }
        ));
        assert_eq!(doc.definitions[0].mesh, Some(0));
        assert_eq!(root.matrix, identity_matrix());
    }

    #[test]
    fn vector_lists_accept_flat_and_nested() {
        let flat = VectorList::Flat(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            flat.to_vec3().expect("flat"),
            vec![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]
        );
        let nested = VectorList::Nested(vec![vec![0.5, 0.25]]);
        assert_eq!(nested.to_vec2().expect("nested"), vec![[0.5, 0.25]]);
        assert!(VectorList::Flat(vec![1.0, 2.0]).to_vec3().is_err());
        assert!(VectorList::Nested(vec![vec![1.0]]).to_vec2().is_err());
    }

    #[test]
    fn view_projection_requires_its_parameter() {
        let mut view: View = serde_json::from_value(json!({
            "name": "v", "mode": "perspective", "fov": 35.0,
            "eye": [0, 0, 0], "target": [0, 1, 0], "up": [0, 0, 1]
        }))
        .expect("view");
        assert_eq!(
            view.projection().expect("perspective"),
            Projection::Perspective { fov_degrees: 35.0 }
        );
        view.mode = "ortho".to_string();
        assert!(view.projection().is_err());
    }
}
