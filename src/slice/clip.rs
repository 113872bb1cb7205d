// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle clipping against the cut plane
//!
//! Triangles are streamed in input order into two growing side buffers.
//! Straddling triangles are split at interpolated crossing vertices, and
//! every split contributes one segment of the cross-section ring.

use super::classify::Classification;
use crate::geometry::{Mesh, Side, Triangle, Vertex};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};

const UNMAPPED: usize = usize::MAX;

/// Faces whose doubled area is below this are treated as zero-area
const DEGENERATE_AREA: f64 = 1e-18;

/// One piece of a cross-section ring, produced by a single triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RingSegment {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    pub submesh: usize,
}

#[derive(Debug, Clone, Copy)]
enum VertexRef {
    Original(usize),
    Crossing(usize),
}

/// Output buffer for one half-space
#[derive(Debug, Default)]
pub(crate) struct SideBuilder {
    pub mesh: Mesh,
    remap: Vec<usize>,
    crossings: AHashMap<usize, usize>,
}

impl SideBuilder {
    fn reset(&mut self, vertex_count: usize, capacity: usize) {
        self.mesh = Mesh::with_capacity(capacity, capacity);
        self.remap.clear();
        self.remap.resize(vertex_count, UNMAPPED);
        self.crossings.clear();
    }

    fn original(&mut self, source: &Mesh, index: usize) -> usize {
        if self.remap[index] == UNMAPPED {
            self.remap[index] = self.mesh.add_vertex(source.vertices[index]);
        }
        self.remap[index]
    }

    fn crossing(&mut self, id: usize, vertex: &Vertex) -> usize {
        if let Some(&local) = self.crossings.get(&id) {
            return local;
        }
        let local = self.mesh.add_vertex(*vertex);
        self.crossings.insert(id, local);
        local
    }

    fn push(&mut self, refs: [VertexRef; 3], submesh: usize, source: &Mesh, crossings: &[Vertex]) {
        let indices = refs.map(|r| match r {
            VertexRef::Original(i) => self.original(source, i),
            VertexRef::Crossing(id) => self.crossing(id, &crossings[id]),
        });
        self.mesh.add_triangle(Triangle::with_submesh(indices, submesh));
    }
}

/// Counters gathered while clipping, used for diagnostics
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ClipStats {
    pub split: usize,
    pub coplanar: usize,
    pub dropped: usize,
}

/// Edge clipper with scratch buffers reused across slices
#[derive(Debug, Default)]
pub(crate) struct Clipper {
    crossings: Vec<Vertex>,
    edge_cache: AHashMap<(usize, usize), usize>,
    pub segments: Vec<RingSegment>,
    pub positive: SideBuilder,
    pub negative: SideBuilder,
    pub stats: ClipStats,
}

impl Clipper {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            crossings: Vec::with_capacity(capacity),
            edge_cache: AHashMap::with_capacity(capacity),
            segments: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    fn reset(&mut self, vertex_count: usize, capacity: usize) {
        self.crossings.clear();
        self.edge_cache.clear();
        self.segments.clear();
        self.positive.reset(vertex_count, capacity);
        self.negative.reset(vertex_count, capacity);
        self.stats = ClipStats::default();
    }

    /// Split every triangle of `mesh` between the two side buffers
    pub fn clip(
        &mut self,
        mesh: &Mesh,
        normal: &Vector3<f64>,
        classification: &Classification,
        capacity: usize,
    ) {
        self.reset(mesh.vertex_count(), capacity);
        let sides = &classification.sides;

        for tri in &mesh.triangles {
            let [a, b, c] = tri.indices;
            let tri_sides = [sides[a], sides[b], sides[c]];
            let positive = tri_sides.iter().filter(|&&s| s == Side::Positive).count();
            let negative = tri_sides.iter().filter(|&&s| s == Side::Negative).count();
            let originals = [
                VertexRef::Original(a),
                VertexRef::Original(b),
                VertexRef::Original(c),
            ];

            match (positive > 0, negative > 0) {
                (true, false) => {
                    self.emit(Side::Positive, originals, tri.submesh, mesh);
                    if positive == 1 {
                        self.push_on_plane_edge(mesh, tri, &tri_sides);
                    }
                }
                (false, true) => self.emit(Side::Negative, originals, tri.submesh, mesh),
                (false, false) => self.assign_coplanar(mesh, tri, normal),
                (true, true) => {
                    self.split(mesh, tri, &tri_sides, &classification.distances);
                    self.stats.split += 1;
                }
            }
        }
    }

    /// Hand the finished side meshes to the caller
    pub fn take_meshes(&mut self) -> (Mesh, Mesh) {
        (
            std::mem::take(&mut self.positive.mesh),
            std::mem::take(&mut self.negative.mesh),
        )
    }

    fn emit(&mut self, side: Side, refs: [VertexRef; 3], submesh: usize, source: &Mesh) {
        let builder = match side {
            Side::Positive => &mut self.positive,
            Side::Negative => &mut self.negative,
            Side::OnPlane => return,
        };
        builder.push(refs, submesh, source, &self.crossings);
    }

    /// A positive triangle with two vertices in the band bounds the cut along that edge
    fn push_on_plane_edge(&mut self, mesh: &Mesh, tri: &Triangle, sides: &[Side; 3]) {
        for k in 0..3 {
            let next = (k + 1) % 3;
            if sides[k] == Side::OnPlane && sides[next] == Side::OnPlane {
                self.segments.push(RingSegment {
                    start: mesh.vertices[tri.indices[k]].position,
                    end: mesh.vertices[tri.indices[next]].position,
                    submesh: tri.submesh,
                });
            }
        }
    }

    /// A triangle lying in the plane belongs to the half it does not face
    fn assign_coplanar(&mut self, mesh: &Mesh, tri: &Triangle, normal: &Vector3<f64>) {
        let [p0, p1, p2] = tri.indices.map(|i| mesh.vertices[i].position);
        let face = (p1 - p0).cross(&(p2 - p0));
        if face.norm_squared() <= DEGENERATE_AREA {
            self.stats.dropped += 1;
            return;
        }

        let side = if face.dot(normal) > 0.0 {
            Side::Negative
        } else {
            Side::Positive
        };
        let [a, b, c] = tri.indices;
        self.emit(
            side,
            [
                VertexRef::Original(a),
                VertexRef::Original(b),
                VertexRef::Original(c),
            ],
            tri.submesh,
            mesh,
        );
        self.stats.coplanar += 1;
    }

    /// Crossing vertex on the edge `i`-`j`, shared by both triangles of the edge
    fn crossing(&mut self, mesh: &Mesh, distances: &[f64], i: usize, j: usize) -> usize {
        let key = if i < j { (i, j) } else { (j, i) };
        if let Some(&id) = self.edge_cache.get(&key) {
            return id;
        }

        // Always interpolate from the lower index so both neighbours agree bit for bit
        let (from, to) = key;
        let (d0, d1) = (distances[from], distances[to]);
        let t = d0 / (d0 - d1);
        let vertex = mesh.vertices[from].lerp(&mesh.vertices[to], t);

        let id = self.crossings.len();
        self.crossings.push(vertex);
        self.edge_cache.insert(key, id);
        id
    }

    fn split(&mut self, mesh: &Mesh, tri: &Triangle, sides: &[Side; 3], distances: &[f64]) {
        let submesh = tri.submesh;

        if let Some(k) = sides.iter().position(|&s| s == Side::OnPlane) {
            // The plane runs through one corner and cuts the opposite edge
            let [v0, v1, v2] = [0, 1, 2].map(|o| tri.indices[(k + o) % 3]);
            let (s1, s2) = (sides[(k + 1) % 3], sides[(k + 2) % 3]);
            let x = self.crossing(mesh, distances, v1, v2);

            self.emit(
                s1,
                [VertexRef::Original(v0), VertexRef::Original(v1), VertexRef::Crossing(x)],
                submesh,
                mesh,
            );
            self.emit(
                s2,
                [VertexRef::Original(v0), VertexRef::Crossing(x), VertexRef::Original(v2)],
                submesh,
                mesh,
            );
            self.segments.push(RingSegment {
                start: mesh.vertices[v0].position,
                end: self.crossings[x].position,
                submesh,
            });
            return;
        }

        // One corner is alone on its side; rotate it to the front
        let positives = sides.iter().filter(|&&s| s == Side::Positive).count();
        let lone_side = if positives == 1 {
            Side::Positive
        } else {
            Side::Negative
        };
        let k = sides.iter().position(|&s| s == lone_side).unwrap_or(0);
        let [v0, v1, v2] = [0, 1, 2].map(|o| tri.indices[(k + o) % 3]);

        let x01 = self.crossing(mesh, distances, v0, v1);
        let x20 = self.crossing(mesh, distances, v2, v0);

        self.emit(
            lone_side,
            [VertexRef::Original(v0), VertexRef::Crossing(x01), VertexRef::Crossing(x20)],
            submesh,
            mesh,
        );
        let other = lone_side.opposite();
        self.emit(
            other,
            [VertexRef::Crossing(x01), VertexRef::Original(v1), VertexRef::Original(v2)],
            submesh,
            mesh,
        );
        self.emit(
            other,
            [VertexRef::Crossing(x01), VertexRef::Original(v2), VertexRef::Crossing(x20)],
            submesh,
            mesh,
        );
        self.segments.push(RingSegment {
            start: self.crossings[x01].position,
            end: self.crossings[x20].position,
            submesh,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Plane, Primitive};
    use crate::slice::classify::classify_vertices;
    use nalgebra::Vector2;

    fn clip(mesh: &Mesh, plane: &Plane) -> Clipper {
        let mut classification = Classification::default();
        classify_vertices(mesh, plane, 1e-5, &mut classification);
        let mut clipper = Clipper::with_capacity(16);
        clipper.clip(mesh, plane.normal(), &classification, 16);
        clipper
    }

    fn triangle(points: [[f64; 3]; 3]) -> Mesh {
        let mut mesh = Mesh::new();
        for (i, p) in points.iter().enumerate() {
            mesh.add_vertex(Vertex::new(
                Point3::new(p[0], p[1], p[2]),
                Vector3::z(),
                Vector2::new(i as f64, 0.0),
            ));
        }
        mesh.add_triangle(Triangle::new([0, 1, 2]));
        mesh
    }

    #[test]
    fn test_lone_vertex_split() {
        let mesh = triangle([[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
        let plane = Plane::new(Vector3::x(), 0.0).unwrap();
        let clipper = clip(&mesh, &plane);

        assert_eq!(clipper.negative.mesh.triangle_count(), 1);
        assert_eq!(clipper.positive.mesh.triangle_count(), 2);
        assert_eq!(clipper.segments.len(), 1);
        assert_eq!(clipper.stats.split, 1);

        let segment = clipper.segments[0];
        assert!(segment.start.x.abs() < 1e-12 && segment.end.x.abs() < 1e-12);
        assert!((segment.start - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((segment.end - Point3::new(0.0, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_split_interpolates_uv() {
        let mesh = triangle([[-1.0, 0.0, 0.0], [3.0, 0.0, 0.0], [-1.0, 1.0, 0.0]]);
        let plane = Plane::new(Vector3::x(), 0.0).unwrap();
        let clipper = clip(&mesh, &plane);

        // Crossing on edge 0-1 sits a quarter of the way along it
        let crossing = clipper
            .positive
            .mesh
            .vertices
            .iter()
            .find(|v| v.position.x.abs() < 1e-12 && v.position.y.abs() < 1e-12)
            .copied()
            .unwrap();
        assert!((crossing.uv.x - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_on_plane_corner_split() {
        let mesh = triangle([[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let plane = Plane::new(Vector3::x(), 0.0).unwrap();
        let clipper = clip(&mesh, &plane);

        assert_eq!(clipper.positive.mesh.triangle_count(), 1);
        assert_eq!(clipper.negative.mesh.triangle_count(), 1);
        assert_eq!(clipper.segments.len(), 1);
    }

    #[test]
    fn test_adjacent_triangles_share_crossings() {
        let mesh = Primitive::indexed_cube(Vector3::new(1.0, 1.0, 1.0)).to_mesh();
        let plane = Plane::new(Vector3::x(), 0.0).unwrap();
        let clipper = clip(&mesh, &plane);

        // Four x-parallel edges plus one face diagonal on each of four faces
        assert_eq!(clipper.crossings.len(), 8);
        assert_eq!(clipper.segments.len(), 8);
        assert_eq!(clipper.positive.mesh.vertex_count(), 4 + 8);
    }

    #[test]
    fn test_coplanar_face_goes_to_the_side_it_does_not_face() {
        let mesh = triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let plane = Plane::new(Vector3::z(), 0.0).unwrap();

        let clipper = clip(&mesh, &plane);
        assert_eq!(clipper.negative.mesh.triangle_count(), 1);
        assert_eq!(clipper.positive.mesh.triangle_count(), 0);

        let clipper = clip(&mesh, &plane.flipped());
        assert_eq!(clipper.positive.mesh.triangle_count(), 1);
        assert_eq!(clipper.stats.coplanar, 1);
    }
}
