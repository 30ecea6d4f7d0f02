use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::host::{HostScene, MaterialId};

/// Identity of a placeholder material. `back` is `None` when back materials are off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MaterialKey {
    pub front: i32,
    pub back: Option<i32>,
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.back {
            Some(back) => write!(f, "{}#{}", self.front, back),
            None => write!(f, "{}#", self.front),
        }
    }
}

/// One placeholder material per distinct (front, back) pair, in creation order.
#[derive(Debug, Default)]
pub struct EmptyMaterialRegistry {
    back_materials: bool,
    by_key: HashMap<MaterialKey, MaterialId>,
    keys_by_material: HashMap<MaterialId, MaterialKey>,
    order: Vec<(MaterialKey, MaterialId)>,
}

impl EmptyMaterialRegistry {
    pub fn new(back_materials: bool) -> Self {
        Self {
            back_materials,
            ..Self::default()
        }
    }

    pub fn key(&self, front: i32, back: i32) -> MaterialKey {
        MaterialKey {
            front,
            back: self.back_materials.then_some(back),
        }
    }

    /// The placeholder for `(front, back)`; created and named after its key on first request.
    pub fn get_or_create(&mut self, host: &mut HostScene, front: i32, back: i32) -> MaterialId {
        let key = self.key(front, back);
        if let Some(id) = self.by_key.get(&key) {
            return *id;
        }
        let id = host.new_material(key.to_string());
        tracing::debug!(key = %key, "created placeholder material");
        self.by_key.insert(key, id);
        self.keys_by_material.insert(id, key);
        self.order.push((key, id));
        id
    }

    pub fn key_of(&self, material: MaterialId) -> Option<MaterialKey> {
        self.keys_by_material.get(&material).copied()
    }

    pub fn back_materials(&self) -> bool {
        self.back_materials
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn entries(&self) -> &[(MaterialKey, MaterialId)] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostCapabilities;

    #[test]
    fn same_pair_returns_same_material() {
        let mut host = HostScene::empty(HostCapabilities::default());
        let mut registry = EmptyMaterialRegistry::new(true);
        let a = registry.get_or_create(&mut host, 3, 3);
        let b = registry.get_or_create(&mut host, 3, 3);
        assert_eq!(a, b);
        assert_eq!(host.materials.len(), 1);
        assert_eq!(host.material(a).name, "3#3");
    }

    #[test]
    fn swapped_pairs_are_distinct() {
        let mut host = HostScene::empty(HostCapabilities::default());
        let mut registry = EmptyMaterialRegistry::new(true);
        let a = registry.get_or_create(&mut host, 3, 4);
        let b = registry.get_or_create(&mut host, 4, 3);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn back_id_is_ignored_when_back_materials_are_off() {
        let mut host = HostScene::empty(HostCapabilities::default());
        let mut registry = EmptyMaterialRegistry::new(false);
        let a = registry.get_or_create(&mut host, 2, 5);
        let b = registry.get_or_create(&mut host, 2, -1);
        assert_eq!(a, b);
        assert_eq!(host.material(a).name, "2#");
        assert_eq!(
            registry.key_of(a),
            Some(MaterialKey {
                front: 2,
                back: None
            })
        );
    }
}
