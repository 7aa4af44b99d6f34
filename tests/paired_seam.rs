//! Paired edits across a seam keep both charts and their pairings consistent.

use mesh_weave::debug_invariants::DebugInvariants;
use mesh_weave::operations::{EdgeCollapse, EdgeSplit, PairedOperation, run_operation};
use mesh_weave::remesh::{PlanarMesh, RemeshCollapse, RemeshParams};
use mesh_weave::seam::{EdgeAddress, MirrorMap, Seams};
use mesh_weave::topology::{MeshAccess, TriMesh};

/// Triangles (0, 2, 1) and (3, 4, 5), glued along (2, 1) ~ (4, 5).
struct Charted {
    mesh: TriMesh,
    map: MirrorMap,
}

impl MeshAccess for Charted {
    fn tri_mesh(&self) -> &TriMesh {
        &self.mesh
    }

    fn mirror_map(&self) -> Option<&MirrorMap> {
        Some(&self.map)
    }
}

const FACES: [[usize; 3]; 2] = [[0, 2, 1], [3, 4, 5]];

fn seam_pair() -> MirrorMap {
    MirrorMap::from_pairs([(EdgeAddress::new(0, 0), EdgeAddress::new(1, 0))])
}

fn charted() -> Charted {
    Charted {
        mesh: TriMesh::from_faces(6, &FACES).unwrap(),
        map: seam_pair(),
    }
}

fn seams(c: &Charted) -> Seams<'_> {
    Seams::of(c)
}

#[test]
fn mirror_orientation_is_consistent() {
    let c = charted();
    let s = seams(&c);
    let t = c.mesh.tuple_from_edge(0, 0).unwrap();
    assert_eq!((t.vid(), c.mesh.switch_vertex(&t).vid()), (2, 1));
    let mt = s.oriented_mirror_edge(&t).unwrap();
    assert!(c.mesh.is_ccw(&mt));
    assert_eq!((mt.vid(), c.mesh.switch_vertex(&mt).vid()), (4, 5));
    assert_eq!(s.oriented_mirror_edge(&mt), Some(t));
    assert_eq!(s.all_mirror_vids(1), vec![1, 4]);
    assert_eq!(s.all_mirror_vids(2), vec![2, 5]);
    assert_eq!(s.canonical_vid(5), 2);
}

#[test]
fn paired_split_then_collapse() {
    let c = charted();
    let split = PairedOperation::new(EdgeSplit, EdgeSplit);
    let t = c.mesh.tuple_from_edge(0, 0).unwrap();
    run_operation(&split, &c, &t).unwrap();
    assert_eq!((c.mesh.vert_capacity(), c.mesh.tri_capacity()), (8, 4));
    assert_eq!(c.map.pairs().len(), 2);
    c.map.validate(&c.mesh).unwrap();

    let collapse = PairedOperation::new(EdgeCollapse, EdgeCollapse);
    let h = c.mesh.tuple_from_vids(2, 6).unwrap();
    assert!(seams(&c).is_seam_edge(&h));
    run_operation(&collapse, &c, &h).unwrap();
    assert_eq!(c.mesh.valid_vertex_count(), 6);
    assert_eq!(c.mesh.valid_face_count(), 2);
    assert_eq!(
        c.map.pairs(),
        vec![(EdgeAddress::new(2, 0), EdgeAddress::new(3, 0))]
    );
    seams(&c).validate_invariants().unwrap();
}

#[test]
fn unpaired_operation_leaves_mirror_side_alone() {
    let c = charted();
    let t = c.mesh.tuple_from_edge(0, 0).unwrap();
    run_operation(&EdgeSplit, &c, &t).unwrap();
    // the seam edge (2, 1) is gone, but its slot was never re-stitched and now
    // glues the half edge (2, 6) to the whole of (4, 5)
    assert!(c.mesh.tuple_from_vids(2, 1).is_none());
    assert_eq!(c.mesh.oriented_tri_vids(1), Some([3, 4, 5]));
    assert_eq!(c.map.pairs(), seam_pair().pairs());
    let stale = c.mesh.tuple_from_edge(0, 0).unwrap();
    assert_eq!(c.mesh.switch_vertex(&stale).vid(), 6);
}

fn charted_planar(target: f64) -> PlanarMesh {
    let points = [
        [0.0, 0.0],
        [0.5, 1.0],
        [1.0, 0.0],
        [5.0, 0.0],
        [6.0, 0.0],
        [5.5, 1.0],
    ];
    PlanarMesh::new(&points, &FACES, RemeshParams::with_target(target))
        .unwrap()
        .with_mirrors(seam_pair())
        .unwrap()
}

#[test]
fn split_pass_subdivides_seam_identically() {
    let m = charted_planar(0.4);
    m.split_pass().unwrap();
    let map = m.mirrors().unwrap();
    map.validate(m.mesh()).unwrap();
    // 1.118 -> 0.559 -> 0.280 on both sides
    assert_eq!(map.pairs().len(), 4);
    for (a, b) in map.pairs() {
        let ta = m.mesh().tuple_from_edge(a.fid, a.local_eid).unwrap();
        let tb = m.mesh().tuple_from_edge(b.fid, b.local_eid).unwrap();
        assert!((m.edge_length(&ta) - m.edge_length(&tb)).abs() < 1e-12);
    }
    assert!(m.all_faces_positive());
    m.validate_invariants().unwrap();
}

#[test]
fn remesh_keeps_pairings_valid() {
    let mut m = charted_planar(0.3);
    m.params.iterations = 2;
    m.remesh().unwrap();
    let map = m.mirrors().unwrap();
    assert!(!map.is_empty());
    map.validate(m.mesh()).unwrap();
    assert!(m.all_faces_positive());
}

/// Two four-cell strips glued along `y = 0`: the upper chart has bottom row
/// 0..=4 and top row 5..=9, the lower chart has top row 10..=14 (copies of
/// 0..=4 at the same positions) and bottom row 15..=19.
fn stacked_strips() -> PlanarMesh {
    let mut points = Vec::new();
    for y in [0.0, 1.0, 0.0, -1.0] {
        points.extend((0..5).map(|i| [i as f64, y]));
    }
    let mut faces = Vec::new();
    for i in 0..4 {
        faces.push([i, i + 1, i + 6]);
        faces.push([i, i + 6, i + 5]);
    }
    for i in 0..4 {
        faces.push([15 + i, 16 + i, 11 + i]);
        faces.push([15 + i, 11 + i, 10 + i]);
    }
    let map = MirrorMap::from_pairs(
        (0..4).map(|i| (EdgeAddress::new(2 * i, 2), EdgeAddress::new(9 + 2 * i, 0))),
    );
    PlanarMesh::new(&points, &faces, RemeshParams::default())
        .unwrap()
        .with_mirrors(map)
        .unwrap()
}

fn collapse_seam_edge(m: &PlanarMesh) -> (usize, usize) {
    let t = m.mesh().tuple_from_vids(1, 2).unwrap();
    let op = PairedOperation::new(RemeshCollapse, RemeshCollapse);
    run_operation(&op, m, &t).unwrap();
    let map = m.mirrors().unwrap();
    map.validate(m.mesh()).unwrap();
    assert_eq!(map.pairs().len(), 3);
    // vertices 20 and 21 replace (1, 2) and their copies (11, 12)
    assert_eq!(m.mesh().valid_vertex_count(), 18);
    assert_eq!(m.seams().all_mirror_vids(20), vec![20, 21]);
    (20, 21)
}

#[test]
fn paired_collapse_keeps_seam_copies_together() {
    let m = stacked_strips();
    let (a, b) = collapse_seam_edge(&m);
    assert_eq!(m.pos(a), m.pos(b));
    assert_eq!(m.pos(a), [1.0, 0.0]);
    assert!(m.all_faces_positive());
}

#[test]
fn fixed_copy_decides_for_both_charts() {
    let m = stacked_strips();
    // only the lower chart's copy of vertex 2 is pinned
    m.set_fixed(12, true).unwrap();
    let (a, b) = collapse_seam_edge(&m);
    assert_eq!(m.pos(a), [2.0, 0.0]);
    assert_eq!(m.pos(b), [2.0, 0.0]);
    assert!(m.all_faces_positive());
}
