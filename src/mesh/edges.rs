//! Edge adjacency for triangle soups.
//!
//! STL files store every triangle with its own copy of each corner, so
//! connectivity has to be recovered from vertex coordinates. [`VertexWelder`]
//! maps coordinates to canonical vertex ids and [`EdgeIndex`] groups the
//! three directed edges of every triangle by their unordered id pair.

use crate::{Mesh, Vector3Ext};
use nalgebra::Vector3;
use rustc_hash::FxHashMap;

/// Maps vertex coordinates to canonical vertex ids.
///
/// With a tolerance of zero, ids are shared by exactly equal coordinates
/// (`-0.0` equals `0.0`). With a positive tolerance, two vertices within
/// `tolerance` on every axis are linked, and ids are shared by every vertex
/// reachable through such links, whatever the insertion order. Lookups go
/// through a hash grid with cell size `tolerance`, so only the 27
/// surrounding cells are searched. Non-finite coordinates only match exactly.
///
/// Vertices are first [`insert`](Self::insert)ed, which returns a node; the
/// final ids come from [`canonical_ids`](Self::canonical_ids) once every
/// vertex is in.
#[derive(Debug, Clone)]
pub struct VertexWelder {
    tolerance: f32,
    exact: FxHashMap<[u32; 3], u32>,
    grid: FxHashMap<[i64; 3], Vec<u32>>,
    positions: Vec<Vector3<f32>>,
    /// Union-find parent per node; roots are the earliest node of a cluster
    parent: Vec<u32>,
}

impl VertexWelder {
    /// Negative or non-finite tolerances fall back to exact matching.
    pub fn new(tolerance: f32) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            0.0
        };
        Self {
            tolerance,
            exact: FxHashMap::default(),
            grid: FxHashMap::default(),
            positions: Vec::new(),
            parent: Vec::new(),
        }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Add a vertex and return its node
    ///
    /// Exactly equal coordinates always get the same node.
    pub fn insert(&mut self, v: Vector3<f32>) -> u32 {
        let next = self.positions.len() as u32;
        let node = *self.exact.entry(exact_key(&v)).or_insert(next);
        if node != next {
            return node;
        }
        self.positions.push(v);
        self.parent.push(node);

        if self.tolerance == 0.0 || !v.iter().all(|c| c.is_finite()) {
            return node;
        }

        let cell = self.cell(&v);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbour = [
                        cell[0].saturating_add(dx),
                        cell[1].saturating_add(dy),
                        cell[2].saturating_add(dz),
                    ];
                    let Some(ids) = self.grid.get(&neighbour) else {
                        continue;
                    };
                    let close: Vec<u32> = ids
                        .iter()
                        .copied()
                        .filter(|&id| self.positions[id as usize].almost_equal(&v, self.tolerance))
                        .collect();
                    for other in close {
                        self.union(node, other);
                    }
                }
            }
        }

        self.grid.entry(cell).or_default().push(node);
        node
    }

    /// Canonical id per node, numbered from 0 in order of first appearance
    pub fn canonical_ids(&mut self) -> Vec<u32> {
        let mut compact = vec![u32::MAX; self.parent.len()];
        let mut ids = Vec::with_capacity(self.parent.len());
        let mut next = 0;
        for node in 0..self.parent.len() as u32 {
            let root = self.find(node) as usize;
            if compact[root] == u32::MAX {
                compact[root] = next;
                next += 1;
            }
            ids.push(compact[root]);
        }
        ids
    }

    /// Number of distinct coordinates inserted so far
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn find(&mut self, mut node: u32) -> u32 {
        while self.parent[node as usize] != node {
            let grandparent = self.parent[self.parent[node as usize] as usize];
            self.parent[node as usize] = grandparent;
            node = grandparent;
        }
        node
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child as usize] = root;
        }
    }

    /// Grid cell of a finite vertex; far-out coordinates saturate
    fn cell(&self, v: &Vector3<f32>) -> [i64; 3] {
        let t = self.tolerance as f64;
        let axis = |c: f32| (c as f64 / t).floor() as i64;
        [axis(v.x), axis(v.y), axis(v.z)]
    }
}

fn exact_key(v: &Vector3<f32>) -> [u32; 3] {
    let bits = |c: f32| if c == 0.0 { 0 } else { c.to_bits() };
    [bits(v.x), bits(v.y), bits(v.z)]
}

/// One directed edge of one triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeOccurrence {
    /// Index of the triangle in mesh order
    pub triangle: usize,
    /// Edge slot 0..3, running from vertex `slot` to vertex `(slot + 1) % 3`
    pub slot: usize,
    /// Canonical id of the start vertex
    pub start: u32,
    /// Canonical id of the end vertex
    pub end: u32,
}

impl EdgeOccurrence {
    /// Order-independent lookup key
    #[inline]
    pub fn key(&self) -> (u32, u32) {
        normalize_edge(self.start, self.end)
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// Edge-to-occurrence adjacency for a mesh.
///
/// Holds three occurrences per triangle. Building is linear in the triangle
/// count; queries touch only the occurrences sharing the edge.
#[derive(Debug, Clone)]
pub struct EdgeIndex {
    /// Occurrence `3 * triangle + slot`
    occurrences: Vec<EdgeOccurrence>,
    /// Maps edge (v0, v1), v0 <= v1, to occurrence positions in mesh order
    edge_to_occurrences: FxHashMap<(u32, u32), Vec<usize>>,
    vertex_count: usize,
}

impl EdgeIndex {
    /// Build with exact vertex matching.
    ///
    /// # Example
    ///
    /// ```
    /// use stlkit::{BBox3, EdgeIndex, Mesh};
    /// use nalgebra::Vector3;
    ///
    /// let mesh = Mesh::from_bbox(&BBox3::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0)));
    /// let index = EdgeIndex::build(&mesh);
    ///
    /// assert_eq!(index.vertex_count(), 8);
    /// assert_eq!(index.edge_count(), 18);
    /// assert_eq!(index.counter_edge_triangles(0, 0).len(), 1);
    /// ```
    #[must_use]
    pub fn build(mesh: &Mesh) -> Self {
        Self::build_with_tolerance(mesh, 0.0)
    }

    /// Build, treating vertices within `tolerance` per axis as identical
    #[must_use]
    pub fn build_with_tolerance(mesh: &Mesh, tolerance: f32) -> Self {
        let mut welder = VertexWelder::new(tolerance);
        let nodes: Vec<[u32; 3]> = mesh
            .triangles()
            .iter()
            .map(|tri| tri.vertices.map(|v| welder.insert(v)))
            .collect();
        let canonical = welder.canonical_ids();
        let vertex_count = canonical.iter().max().map_or(0, |&id| id as usize + 1);

        let mut occurrences = Vec::with_capacity(mesh.triangle_count() * 3);
        let mut edge_to_occurrences: FxHashMap<(u32, u32), Vec<usize>> = FxHashMap::default();

        for (triangle, tri_nodes) in nodes.iter().enumerate() {
            let ids = tri_nodes.map(|node| canonical[node as usize]);
            for slot in 0..3 {
                let occurrence = EdgeOccurrence {
                    triangle,
                    slot,
                    start: ids[slot],
                    end: ids[(slot + 1) % 3],
                };
                edge_to_occurrences
                    .entry(occurrence.key())
                    .or_default()
                    .push(occurrences.len());
                occurrences.push(occurrence);
            }
        }

        log::debug!(
            "edge index: {} triangles, {} vertices, {} edges",
            mesh.triangle_count(),
            vertex_count,
            edge_to_occurrences.len()
        );

        Self {
            occurrences,
            edge_to_occurrences,
            vertex_count,
        }
    }

    /// Get the occurrence for a triangle's edge slot
    pub fn occurrence(&self, triangle: usize, slot: usize) -> Option<&EdgeOccurrence> {
        if slot >= 3 {
            return None;
        }
        self.occurrences.get(triangle * 3 + slot)
    }

    /// Canonical vertex ids of a triangle
    pub fn vertex_ids(&self, triangle: usize) -> Option<[u32; 3]> {
        let first = self.occurrence(triangle, 0)?;
        let second = self.occurrence(triangle, 1)?;
        Some([first.start, first.end, second.end])
    }

    /// Every occurrence of the undirected edge between two vertex ids, in mesh order
    pub fn occurrences_for_edge(
        &self,
        v0: u32,
        v1: u32,
    ) -> impl Iterator<Item = &EdgeOccurrence> + '_ {
        self.edge_to_occurrences
            .get(&normalize_edge(v0, v1))
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .map(move |&i| &self.occurrences[i])
    }

    /// Triangles using the same directed edge, excluding this occurrence
    pub fn same_edge_triangles(&self, triangle: usize, slot: usize) -> Vec<usize> {
        self.classify(triangle, slot).0
    }

    /// Triangles using the edge in the opposite direction
    pub fn counter_edge_triangles(&self, triangle: usize, slot: usize) -> Vec<usize> {
        self.classify(triangle, slot).1
    }

    /// Split the other occurrences of an edge into (same direction, opposite direction)
    ///
    /// For a degenerate edge both directions coincide; matches count as same
    /// direction only.
    pub fn classify(&self, triangle: usize, slot: usize) -> (Vec<usize>, Vec<usize>) {
        let mut same = Vec::new();
        let mut counter = Vec::new();
        let Some(own) = self.occurrence(triangle, slot) else {
            return (same, counter);
        };

        for other in self.occurrences_for_edge(own.start, own.end) {
            if other.triangle == own.triangle && other.slot == own.slot {
                continue;
            }
            if other.start == own.start && other.end == own.end {
                same.push(other.triangle);
            } else if other.start == own.end && other.end == own.start {
                counter.push(other.triangle);
            }
        }
        (same, counter)
    }

    /// Number of distinct undirected edges
    pub fn edge_count(&self) -> usize {
        self.edge_to_occurrences.len()
    }

    /// Number of distinct vertices after welding
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of directed edge occurrences, three per triangle
    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }
}

/// Normalize edge direction so v0 <= v1.
#[inline]
fn normalize_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BBox3, Triangle};

    fn two_triangles_sharing_edge() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_triangle_vertices(Vector3::zeros(), Vector3::x(), Vector3::y());
        mesh.add_triangle_vertices(Vector3::x(), Vector3::new(1.0, 1.0, 0.0), Vector3::y());
        mesh
    }

    fn weld(tolerance: f32, points: &[Vector3<f32>]) -> Vec<u32> {
        let mut welder = VertexWelder::new(tolerance);
        let nodes: Vec<u32> = points.iter().map(|p| welder.insert(*p)).collect();
        let canonical = welder.canonical_ids();
        nodes.iter().map(|&node| canonical[node as usize]).collect()
    }

    #[test]
    fn welder_exact() {
        let ids = weld(
            0.0,
            &[
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, -0.0, 0.0),
                Vector3::new(1.0, 0.0, 1e-7),
            ],
        );
        assert_eq!(ids, vec![0, 0, 1]);
    }

    #[test]
    fn welder_with_tolerance_crosses_cell_borders() {
        // 0.0099 and 0.0101 fall into different grid cells
        let ids = weld(
            0.01,
            &[
                Vector3::new(0.0099, 5.0, 5.0),
                Vector3::new(0.0101, 5.0, 5.0),
                Vector3::new(0.05, 5.0, 5.0),
            ],
        );
        assert_eq!(ids, vec![0, 0, 1]);
    }

    #[test]
    fn welder_links_chains_in_any_order() {
        let a = Vector3::new(1.0, 1.0, 1.0);
        let b = a + Vector3::new(0.008, 0.0, 0.0);
        let c = a + Vector3::new(0.016, 0.0, 0.0);

        // a and c are too far apart on their own; b joins them
        assert_eq!(weld(0.01, &[a, c, b]), vec![0, 0, 0]);
        assert_eq!(weld(0.01, &[a, b, c]), vec![0, 0, 0]);
        assert_eq!(weld(0.01, &[a, c]), vec![0, 1]);
    }

    #[test]
    fn welder_survives_extreme_coordinates() {
        let ids = weld(
            1e-3,
            &[
                Vector3::new(1e16, 0.0, 0.0),
                Vector3::new(f32::MAX, -f32::MAX, 0.0),
                Vector3::new(f32::MAX, -f32::MAX, 0.0),
                Vector3::new(f32::INFINITY, 0.0, 0.0),
                Vector3::new(f32::INFINITY, 0.0, 0.0),
                Vector3::new(f32::NAN, 0.0, 0.0),
            ],
        );
        assert_eq!(ids, vec![0, 1, 1, 2, 2, 3]);
    }

    #[test]
    fn welder_rejects_bad_tolerance() {
        assert_eq!(VertexWelder::new(-1.0).tolerance(), 0.0);
        assert_eq!(VertexWelder::new(f32::NAN).tolerance(), 0.0);
    }

    #[test]
    fn shared_edge_is_counter_edge() {
        let mesh = two_triangles_sharing_edge();
        let index = EdgeIndex::build(&mesh);

        assert_eq!(index.vertex_count(), 4);
        assert_eq!(index.edge_count(), 5);
        assert_eq!(index.occurrence_count(), 6);

        // triangle 0 edge 1 runs x -> y, triangle 1 edge 2 runs y -> x
        assert_eq!(index.counter_edge_triangles(0, 1), vec![1]);
        assert_eq!(index.counter_edge_triangles(1, 2), vec![0]);
        assert!(index.same_edge_triangles(0, 1).is_empty());

        // boundary
        assert!(index.counter_edge_triangles(0, 0).is_empty());
    }

    #[test]
    fn duplicate_triangle_is_same_edge() {
        let mut mesh = two_triangles_sharing_edge();
        let copy = *mesh.triangle(0).unwrap();
        mesh.add_triangle(copy);
        let index = EdgeIndex::build(&mesh);

        for slot in 0..3 {
            assert_eq!(index.same_edge_triangles(0, slot), vec![2]);
            assert_eq!(index.same_edge_triangles(2, slot), vec![0]);
        }
        assert_eq!(index.counter_edge_triangles(1, 2), vec![0, 2]);
    }

    #[test]
    fn vertex_ids_follow_triangle_order() {
        let mesh = two_triangles_sharing_edge();
        let index = EdgeIndex::build(&mesh);
        assert_eq!(index.vertex_ids(0), Some([0, 1, 2]));
        assert_eq!(index.vertex_ids(1), Some([1, 3, 2]));
        assert_eq!(index.vertex_ids(2), None);
        assert!(index.occurrence(0, 3).is_none());
    }

    #[test]
    fn degenerate_edge() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        let mesh = Mesh::from_triangles(vec![Triangle::new([p, p, Vector3::zeros()], Vector3::z())]);
        let index = EdgeIndex::build(&mesh);
        assert!(index.occurrence(0, 0).unwrap().is_degenerate());
        // edges 1 (p -> 0) and 2 (0 -> p) oppose each other inside the same triangle
        assert_eq!(index.counter_edge_triangles(0, 1), vec![0]);
    }

    #[test]
    fn cube_is_closed() {
        let mesh = Mesh::from_bbox(&BBox3::new(Vector3::zeros(), Vector3::new(1.0, 2.0, 3.0)));
        let index = EdgeIndex::build(&mesh);
        for triangle in 0..mesh.triangle_count() {
            for slot in 0..3 {
                assert_eq!(index.counter_edge_triangles(triangle, slot).len(), 1);
                assert!(index.same_edge_triangles(triangle, slot).is_empty());
            }
        }
    }
}
