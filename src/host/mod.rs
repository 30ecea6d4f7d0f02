//! In-memory host scene the importer writes into.
//!
//! Arenas of objects, meshes, materials, node trees, images and cameras,
//! addressed by typed indices. The importer never removes datablocks, so an
//! id stays valid for the lifetime of the scene.
//!
//! - `mesh`: vertex/edge/loop/polygon buffers
//! - `node_tree`: shader node trees and node groups
//! - `object`: scene objects, parenting, material slots
//! - `settings`: render, unit and capability settings

pub mod mesh;
pub mod node_tree;
pub mod object;
pub mod settings;

use std::path::PathBuf;

use glam::Mat4;
use serde::Serialize;

pub use mesh::Mesh;
pub use node_tree::{NodeId, NodeTree, TreeUsage};
pub use object::{MaterialSlot, ObjectData, SceneObject, SlotLink};
pub use settings::{HostCapabilities, RenderEngine, RenderSettings};

use crate::schema::NodeKind;

macro_rules! id_type {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
            pub struct $name(pub usize);
        )*
    };
}

id_type!(ObjectId, MeshId, MaterialId, NodeTreeId, ImageId, TextureId, CameraId, LampId);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    pub use_nodes: bool,
    pub node_tree: Option<NodeTreeId>,
    pub diffuse_color: [f32; 3],
    pub alpha: f32,
    pub use_transparency: bool,
    pub use_cast_shadows: bool,
    pub texture_slots: Vec<TextureId>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            use_nodes: false,
            node_tree: None,
            diffuse_color: [0.8, 0.8, 0.8],
            alpha: 1.0,
            use_transparency: false,
            use_cast_shadows: true,
            texture_slots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    pub name: String,
    pub filepath: PathBuf,
    pub size: [u32; 2],
    #[serde(skip)]
    pub packed: Option<Vec<u8>>,
}

impl Image {
    pub fn is_packed(&self) -> bool {
        self.packed.is_some()
    }
}

/// Legacy internal-renderer texture datablock wrapping an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Texture {
    pub name: String,
    pub image: ImageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CameraKind {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraData {
    pub name: String,
    pub kind: CameraKind,
    pub sensor_width: f32,
    /// Field of view in radians.
    pub angle: f32,
    pub ortho_scale: f32,
}

impl CameraData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CameraKind::Perspective,
            sensor_width: 32.0,
            angle: 0.857_556,
            ortho_scale: 7.314_285,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShadowMethod {
    NoShadow,
    RayShadow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lamp {
    pub name: String,
    pub shadow_method: ShadowMethod,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HostScene {
    pub capabilities: HostCapabilities,
    pub render: RenderSettings,
    pub objects: Vec<SceneObject>,
    /// Objects linked into the scene, in link order.
    pub scene_objects: Vec<ObjectId>,
    /// Active scene camera.
    pub camera: Option<ObjectId>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub node_trees: Vec<NodeTree>,
    pub images: Vec<Image>,
    pub textures: Vec<Texture>,
    pub cameras: Vec<CameraData>,
    pub lamps: Vec<Lamp>,
}

impl HostScene {
    /// Empty scene: no camera, no lamp.
    pub fn empty(capabilities: HostCapabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Factory scene: a `Camera` object set as scene camera and a `Sun` lamp.
    pub fn startup(capabilities: HostCapabilities) -> Self {
        let mut scene = Self::empty(capabilities);

        let camera = scene.new_camera("Camera");
        let camera_obj = scene.new_object("Camera", ObjectData::Camera(camera));
        scene.object_mut(camera_obj).matrix_local = Mat4::from_translation(glam::vec3(7.48, -6.51, 5.34));
        scene.link_object(camera_obj);
        scene.camera = Some(camera_obj);

        let lamp = LampId(scene.lamps.len());
        scene.lamps.push(Lamp {
            name: "Sun".to_string(),
            shadow_method: ShadowMethod::NoShadow,
        });
        let sun = scene.new_object("Sun", ObjectData::Lamp(lamp));
        scene.link_object(sun);

        scene
    }

    pub fn new_object(&mut self, name: impl Into<String>, data: ObjectData) -> ObjectId {
        let mut object = SceneObject::new(name, data);
        if let ObjectData::Mesh(mesh) = data {
            object.material_slots = vec![
                MaterialSlot {
                    link: SlotLink::Data,
                    material: None,
                };
                self.mesh(mesh).materials.len()
            ];
        }
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn object(&self, id: ObjectId) -> &SceneObject {
        &self.objects[id.0]
    }

    pub fn object_mut(&mut self, id: ObjectId) -> &mut SceneObject {
        &mut self.objects[id.0]
    }

    pub fn find_object(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|o| o.name == name)
            .map(ObjectId)
    }

    pub fn set_parent(&mut self, child: ObjectId, parent: ObjectId) {
        self.objects[child.0].parent = Some(parent);
        self.objects[parent.0].children.push(child);
    }

    pub fn link_object(&mut self, id: ObjectId) {
        if !self.scene_objects.contains(&id) {
            self.scene_objects.push(id);
        }
    }

    pub fn world_matrix(&self, id: ObjectId) -> Mat4 {
        let object = self.object(id);
        match object.parent {
            Some(parent) => self.world_matrix(parent) * object.matrix_local,
            None => object.matrix_local,
        }
    }

    /// Material a slot renders with: the object override, else the mesh's slot material.
    pub fn slot_material(&self, id: ObjectId, slot: usize) -> Option<MaterialId> {
        let object = self.object(id);
        let s = object.material_slots.get(slot)?;
        match s.link {
            SlotLink::Object => s.material,
            SlotLink::Data => object
                .mesh()
                .and_then(|m| self.mesh(m).materials.get(slot).copied()),
        }
    }

    pub fn new_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    pub fn new_material(&mut self, name: impl Into<String>) -> MaterialId {
        self.materials.push(Material::new(name));
        MaterialId(self.materials.len() - 1)
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn material_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.materials[id.0]
    }

    pub fn find_material(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(MaterialId)
    }

    /// Turn on node shading; the starter nodes depend on the render engine.
    pub fn enable_material_nodes(&mut self, id: MaterialId) -> anyhow::Result<NodeTreeId> {
        if let Some(tree) = self.material(id).node_tree {
            self.material_mut(id).use_nodes = true;
            return Ok(tree);
        }
        let mut tree = NodeTree::new(self.material(id).name.clone(), TreeUsage::Material);
        match self.render.engine {
            RenderEngine::Cycles => {
                let bsdf = tree.add_node(NodeKind::BsdfDiffuse);
                let out = tree.add_node(NodeKind::MaterialOutput);
                tree.set_location(bsdf, [10.0, 300.0])?;
                tree.set_location(out, [300.0, 300.0])?;
                tree.link(bsdf, 0, out, 0)?;
            }
            RenderEngine::BlenderRender => {
                let material = tree.add_node(NodeKind::Material);
                let out = tree.add_node(NodeKind::Output);
                tree.set_location(material, [10.0, 300.0])?;
                tree.set_location(out, [300.0, 300.0])?;
                tree.link(material, 0, out, 0)?;
            }
        }
        let tree = self.new_node_tree(tree);
        let material = self.material_mut(id);
        material.use_nodes = true;
        material.node_tree = Some(tree);
        Ok(tree)
    }

    pub fn new_node_tree(&mut self, tree: NodeTree) -> NodeTreeId {
        self.node_trees.push(tree);
        NodeTreeId(self.node_trees.len() - 1)
    }

    pub fn node_tree(&self, id: NodeTreeId) -> &NodeTree {
        &self.node_trees[id.0]
    }

    pub fn node_tree_mut(&mut self, id: NodeTreeId) -> &mut NodeTree {
        &mut self.node_trees[id.0]
    }

    pub fn find_node_group(&self, name: &str) -> Option<NodeTreeId> {
        self.node_trees
            .iter()
            .position(|t| t.usage == TreeUsage::Group && t.name == name)
            .map(NodeTreeId)
    }

    /// Add a group node instancing `group` into `tree`.
    pub fn add_group_node(&mut self, tree: NodeTreeId, group: NodeTreeId) -> NodeId {
        let source = self.node_tree(group);
        let (inputs, outputs) = (source.inputs.clone(), source.outputs.clone());
        self.node_tree_mut(tree).add_group_node(group, inputs, outputs)
    }

    pub fn new_image(&mut self, image: Image) -> ImageId {
        self.images.push(image);
        ImageId(self.images.len() - 1)
    }

    pub fn image(&self, id: ImageId) -> &Image {
        &self.images[id.0]
    }

    pub fn new_texture(&mut self, name: impl Into<String>, image: ImageId) -> TextureId {
        self.textures.push(Texture {
            name: name.into(),
            image,
        });
        TextureId(self.textures.len() - 1)
    }

    pub fn new_camera(&mut self, name: impl Into<String>) -> CameraId {
        self.cameras.push(CameraData::new(name));
        CameraId(self.cameras.len() - 1)
    }

    pub fn camera(&self, id: CameraId) -> &CameraData {
        &self.cameras[id.0]
    }

    pub fn camera_mut(&mut self, id: CameraId) -> &mut CameraData {
        &mut self.cameras[id.0]
    }

    pub fn lamp_mut(&mut self, id: LampId) -> &mut Lamp {
        &mut self.lamps[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_scene_has_scene_camera_and_sun() {
        let scene = HostScene::startup(HostCapabilities::default());
        let camera = scene.camera.expect("scene camera");
        assert_eq!(scene.object(camera).name, "Camera");
        assert_eq!(scene.cameras.len(), 1);
        assert!(scene.find_object("Sun").is_some());
        assert_eq!(scene.scene_objects.len(), 2);
    }

    #[test]
    fn starter_nodes_follow_render_engine() {
        let mut scene = HostScene::empty(HostCapabilities::default());
        let m = scene.new_material("m");
        scene.render.engine = RenderEngine::Cycles;
        let tree = scene.enable_material_nodes(m).expect("nodes");
        let tree = scene.node_tree(tree);
        assert!(tree.find_node("Diffuse BSDF").is_some());
        assert!(tree.find_node("Material Output").is_some());

        let m = scene.new_material("legacy");
        scene.render.engine = RenderEngine::BlenderRender;
        let tree = scene.enable_material_nodes(m).expect("nodes");
        let tree = scene.node_tree(tree);
        assert!(tree.find_node("Material").is_some());
        assert!(tree.find_node("Output").is_some());
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = HostScene::empty(HostCapabilities::default());
        let parent = scene.new_object("p", ObjectData::Empty);
        let child = scene.new_object("c", ObjectData::Empty);
        scene.set_parent(child, parent);
        scene.object_mut(parent).matrix_local = Mat4::from_translation(glam::vec3(1.0, 0.0, 0.0));
        scene.object_mut(child).matrix_local = Mat4::from_translation(glam::vec3(0.0, 2.0, 0.0));
        let world = scene.world_matrix(child);
        assert_eq!(world.w_axis.truncate(), glam::vec3(1.0, 2.0, 0.0));
    }
}
