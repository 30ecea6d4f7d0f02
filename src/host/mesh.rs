use serde::Serialize;

use super::MaterialId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MeshEdge {
    pub vertices: [u32; 2],
    pub use_edge_sharp: bool,
    pub use_seam: bool,
    pub use_freestyle_mark: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshLoop {
    pub vertex: u32,
    pub edge: u32,
    /// Custom split normal.
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshPolygon {
    pub loop_start: u32,
    pub loop_total: u32,
    pub material_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UvLayer {
    pub name: String,
    pub data: Vec<[f32; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub edges: Vec<MeshEdge>,
    pub loops: Vec<MeshLoop>,
    pub polygons: Vec<MeshPolygon>,
    pub uv_layers: Vec<UvLayer>,
    /// Slot table; polygons refer to it through `material_index`.
    pub materials: Vec<MaterialId>,
    pub has_custom_normals: bool,
    pub use_auto_smooth: bool,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set_custom_split_normals(&mut self, normals: &[[f32; 3]]) -> Result<(), String> {
        if normals.len() != self.loops.len() {
            return Err(format!(
                "{} custom normals for {} loops",
                normals.len(),
                self.loops.len()
            ));
        }
        for (l, n) in self.loops.iter_mut().zip(normals) {
            l.normal = *n;
        }
        self.has_custom_normals = true;
        Ok(())
    }

    pub fn add_uv_layer(&mut self, name: impl Into<String>, data: Vec<[f32; 2]>) -> Result<(), String> {
        if data.len() != self.loops.len() {
            return Err(format!("{} uvs for {} loops", data.len(), self.loops.len()));
        }
        self.uv_layers.push(UvLayer {
            name: name.into(),
            data,
        });
        Ok(())
    }

    /// Check buffer cross-references. `clean_custom_data` drops the split normals.
    pub fn validate(&mut self, clean_custom_data: bool) -> Result<(), String> {
        let n_verts = self.vertices.len();
        if let Some((i, e)) = self
            .edges
            .iter()
            .enumerate()
            .find(|(_, e)| e.vertices.iter().any(|&v| v as usize >= n_verts))
        {
            return Err(format!("edge {i} {:?} references a missing vertex", e.vertices));
        }
        if let Some((i, l)) = self.loops.iter().enumerate().find(|(_, l)| {
            l.vertex as usize >= n_verts || l.edge as usize >= self.edges.len()
        }) {
            return Err(format!(
                "loop {i} (vertex {}, edge {}) is out of range",
                l.vertex, l.edge
            ));
        }
        for (i, p) in self.polygons.iter().enumerate() {
            let end = p.loop_start as usize + p.loop_total as usize;
            if end > self.loops.len() {
                return Err(format!("polygon {i} loops end at {end} of {}", self.loops.len()));
            }
            if p.material_index as usize >= self.materials.len().max(1) {
                return Err(format!(
                    "polygon {i} uses material slot {} of {}",
                    p.material_index,
                    self.materials.len()
                ));
            }
        }
        if clean_custom_data {
            self.has_custom_normals = false;
        }
        Ok(())
    }
}
