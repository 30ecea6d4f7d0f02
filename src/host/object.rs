use glam::{Mat4, Quat, Vec3};
use serde::Serialize;

use super::{CameraId, LampId, MaterialId, MeshId, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectData {
    Empty,
    Mesh(MeshId),
    Camera(CameraId),
    Lamp(LampId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotLink {
    /// Slot follows the mesh's material list.
    Data,
    /// Slot overridden on this object.
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaterialSlot {
    pub link: SlotLink,
    /// Object-level material; only meaningful when `link` is `Object`.
    pub material: Option<MaterialId>,
}

/// Local transform split into parts. Informational: placement uses `matrix_local`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decomposed {
    pub location: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Decomposed {
    pub fn from_matrix(m: &Mat4) -> Self {
        let (scale, rotation, location) = m.to_scale_rotation_translation();
        Self {
            location,
            rotation,
            scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneObject {
    pub name: String,
    pub data: ObjectData,
    pub parent: Option<ObjectId>,
    pub children: Vec<ObjectId>,
    pub matrix_local: Mat4,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decomposed: Option<Decomposed>,
    pub material_slots: Vec<MaterialSlot>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, data: ObjectData) -> Self {
        Self {
            name: name.into(),
            data,
            parent: None,
            children: Vec::new(),
            matrix_local: Mat4::IDENTITY,
            decomposed: None,
            material_slots: Vec::new(),
        }
    }

    pub fn mesh(&self) -> Option<MeshId> {
        match self.data {
            ObjectData::Mesh(id) => Some(id),
            _ => None,
        }
    }

    pub fn camera(&self) -> Option<CameraId> {
        match self.data {
            ObjectData::Camera(id) => Some(id),
            _ => None,
        }
    }
}
