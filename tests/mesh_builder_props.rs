use blendup_import::document::{EdgeFlagOptions, MeshRecord, VectorList};
use blendup_import::import::mesh_builder::build_mesh_buffers;
use proptest::prelude::*;

fn record(vertex_count: usize, faces: Vec<(Vec<u32>, i32, i32)>) -> MeshRecord {
    let loops: usize = faces.iter().map(|(f, _, _)| f.len()).sum();
    MeshRecord {
        vertices: VectorList::Flat((0..vertex_count * 3).map(|i| i as f32).collect()),
        indices: faces.iter().map(|(f, _, _)| f.clone()).collect(),
        normals: VectorList::Flat(vec![0.0; loops * 3]),
        edges: vec![0; loops],
        materials: faces.iter().map(|(_, front, _)| *front).collect(),
        back_materials: faces.iter().map(|(_, _, back)| *back).collect(),
        uvs: VectorList::Flat(vec![0.5; loops * 2]),
    }
}

fn mesh_record() -> impl Strategy<Value = MeshRecord> {
    (3usize..10).prop_flat_map(|vertex_count| {
        let face = (
            prop::collection::vec(0..vertex_count as u32, 3..7),
            -1i32..4,
            -1i32..4,
        );
        prop::collection::vec(face, 1..12).prop_map(move |faces| record(vertex_count, faces))
    })
}

proptest! {
    #[test]
    fn one_loop_and_one_edge_per_corner(rec in mesh_record()) {
        let built = build_mesh_buffers(&rec, 0, EdgeFlagOptions::default()).unwrap();
        let corners: usize = rec.indices.iter().map(Vec::len).sum();
        prop_assert_eq!(built.mesh.loops.len(), corners);
        prop_assert_eq!(built.mesh.edges.len(), corners);
        prop_assert_eq!(built.mesh.polygons.len(), rec.indices.len());
    }

    #[test]
    fn edges_rederive_from_polygon_loops(rec in mesh_record()) {
        let built = build_mesh_buffers(&rec, 0, EdgeFlagOptions::default()).unwrap();
        let mesh = &built.mesh;
        let mut seen = 0;
        for (polygon, face) in mesh.polygons.iter().zip(&rec.indices) {
            let start = polygon.loop_start as usize;
            for (i, l) in mesh.loops[start..start + polygon.loop_total as usize].iter().enumerate() {
                prop_assert_eq!(l.vertex, face[i]);
                let edge = mesh.edges[l.edge as usize];
                prop_assert_eq!(edge.vertices, [face[i], face[(i + 1) % face.len()]]);
                seen += 1;
            }
        }
        prop_assert_eq!(seen, mesh.edges.len());
    }

    #[test]
    fn slots_follow_material_pairs(rec in mesh_record()) {
        let built = build_mesh_buffers(&rec, 0, EdgeFlagOptions::default()).unwrap();
        let polygons = &built.mesh.polygons;
        for a in 0..polygons.len() {
            for b in 0..polygons.len() {
                let same_pair = (rec.materials[a], rec.back_materials[a])
                    == (rec.materials[b], rec.back_materials[b]);
                let same_slot = polygons[a].material_index == polygons[b].material_index;
                prop_assert_eq!(same_pair, same_slot);
            }
        }
        for (i, p) in polygons.iter().enumerate() {
            let (front, back) = built.slots[p.material_index as usize];
            prop_assert_eq!((rec.materials[i], rec.back_materials[i]), (front, back));
        }
    }
}

#[test]
fn two_triangles_sharing_an_edge_emit_it_twice() {
    let rec = record(
        4,
        vec![(vec![0, 1, 2], 0, -1), (vec![2, 1, 3], 0, -1)],
    );
    let built = build_mesh_buffers(&rec, 0, EdgeFlagOptions::default()).unwrap();
    let edges = &built.mesh.edges;
    assert_eq!(edges.len(), 6);
    assert_eq!(edges[1].vertices, [1, 2]);
    assert_eq!(edges[4].vertices, [1, 3]);
    assert_eq!(edges[5].vertices, [3, 2]);
    assert_eq!(edges[3].vertices, [2, 1]);
    assert_eq!(built.slots, vec![(0, -1)]);
}

#[test]
fn sharp_flags_are_consumed_by_edge_index() {
    let mut rec = record(4, vec![(vec![0, 1, 2], 0, -1), (vec![2, 1, 3], 0, -1)]);
    rec.edges = vec![0, 1, 0, 1, 0, 0];
    let flags = EdgeFlagOptions {
        sharp: true,
        ..EdgeFlagOptions::default()
    };
    let built = build_mesh_buffers(&rec, 0, flags).unwrap();
    let sharp: Vec<bool> = built.mesh.edges.iter().map(|e| e.use_edge_sharp).collect();
    assert_eq!(sharp, vec![false, true, false, true, false, false]);
    assert!(built.mesh.edges.iter().all(|e| !e.use_seam));
}
