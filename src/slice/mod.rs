// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane slicing of triangle meshes
//!
//! [`MeshCutter::slice`] runs three passes over the input:
//! classify every vertex against the plane, clip every triangle into the
//! positive and negative buffers, then close the cross-section on both
//! halves with cap triangles.

mod cap;
mod classify;
mod clip;

pub use cap::CapReport;

use crate::config::SliceConfig;
use crate::error::Result;
use crate::geometry::{surface_area, volume, Mesh, Plane, Side};
use cap::CapBuilder;
use classify::{classify_vertices, Classification};
use clip::Clipper;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// How the plane met the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceOutcome {
    /// Both halves received geometry
    Intersected,
    /// The whole mesh lies on one side, or flat inside the on-plane band;
    /// it was copied to one side
    NoIntersection,
    /// Nothing to cut: the mesh has no triangles and both halves are empty
    Degenerate,
}

/// The two halves of a slice and what is known about them
#[derive(Debug, Clone, PartialEq)]
pub struct SliceResult {
    /// Geometry on the side the plane normal points to, capped facing `-normal`
    pub positive: Mesh,
    /// Geometry behind the plane, capped facing `+normal`
    pub negative: Mesh,
    pub outcome: SliceOutcome,
    pub cap: CapReport,
    pub positive_area: f64,
    pub negative_area: f64,
    pub positive_volume: f64,
    pub negative_volume: f64,
    /// First vertex of the input, if any
    pub first_vertex: Option<Point3<f64>>,
}

impl SliceResult {
    fn new(
        positive: Mesh,
        negative: Mesh,
        outcome: SliceOutcome,
        cap: CapReport,
        first_vertex: Option<Point3<f64>>,
    ) -> Self {
        Self {
            positive_area: surface_area(&positive),
            negative_area: surface_area(&negative),
            positive_volume: volume(&positive),
            negative_volume: volume(&negative),
            positive,
            negative,
            outcome,
            cap,
            first_vertex,
        }
    }

    /// The plane actually separated the mesh into two non-empty halves
    pub fn intersected(&self) -> bool {
        self.outcome == SliceOutcome::Intersected
    }

    /// Side with the greater surface area; ties go to the positive side
    pub fn larger_side(&self) -> Side {
        if self.positive_area >= self.negative_area {
            Side::Positive
        } else {
            Side::Negative
        }
    }

    /// Side of `plane` the input's first vertex lies on, points on the plane
    /// counting as positive. Used to place pieces the plane did not cut.
    pub fn first_vertex_side(&self, plane: &Plane) -> Option<Side> {
        self.first_vertex.map(|p| {
            if plane.signed_distance(&p) >= 0.0 {
                Side::Positive
            } else {
                Side::Negative
            }
        })
    }

    /// Consume the result, keeping both halves
    pub fn into_meshes(self) -> (Mesh, Mesh) {
        (self.positive, self.negative)
    }
}

/// Reusable slicer.
///
/// Owns the per-vertex and per-edge scratch buffers so that repeated slices
/// on one thread do not reallocate. A cutter must not be shared between
/// threads; give each worker its own.
#[derive(Debug)]
pub struct MeshCutter {
    config: SliceConfig,
    classification: Classification,
    clipper: Clipper,
}

impl MeshCutter {
    /// Cutter with default settings and scratch sized for `capacity` vertices
    pub fn new(capacity: usize) -> Self {
        Self::with_config(SliceConfig {
            capacity_hint: capacity,
            ..SliceConfig::default()
        })
    }

    pub fn with_config(config: SliceConfig) -> Self {
        let capacity = config.capacity_hint;
        Self {
            config,
            classification: Classification::with_capacity(capacity),
            clipper: Clipper::with_capacity(capacity),
        }
    }

    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    /// Cut `mesh` with `plane`.
    ///
    /// The input is left untouched. Malformed input (bad indices,
    /// non-finite positions) is rejected before any work starts; a plane
    /// that misses the mesh is not an error and yields
    /// [`SliceOutcome::NoIntersection`].
    pub fn slice(&mut self, mesh: &Mesh, plane: &Plane) -> Result<SliceResult> {
        mesh.validate()?;
        let first_vertex = mesh.vertices.first().map(|v| v.position);

        if mesh.is_empty() {
            log::debug!("slice: empty mesh, nothing to cut");
            return Ok(SliceResult::new(
                Mesh::new(),
                Mesh::new(),
                SliceOutcome::Degenerate,
                CapReport::default(),
                first_vertex,
            ));
        }

        let diagonal = mesh.bounding_box().diagonal();
        let epsilon = self.config.effective_epsilon(diagonal);
        classify_vertices(mesh, plane, epsilon, &mut self.classification);

        let classification = &self.classification;
        log::debug!(
            "slice: {} vertices, {} triangles, epsilon {:.3e} ({} positive, {} negative)",
            mesh.vertex_count(),
            mesh.triangle_count(),
            epsilon,
            classification.positive,
            classification.negative,
        );
        if classification.on_plane > 0 {
            log::trace!("slice: {} vertices snapped onto the plane", classification.on_plane);
        }

        if !classification.spans_plane() {
            let side = if classification.positive > 0 {
                Side::Positive
            } else if classification.negative > 0 {
                Side::Negative
            } else {
                facing_side(mesh, plane)
            };
            log::debug!("slice: no intersection, whole mesh goes to the {:?} side", side);
            return Ok(whole(mesh, side, SliceOutcome::NoIntersection, first_vertex));
        }

        self.clipper
            .clip(mesh, plane.normal(), classification, self.config.capacity_hint);
        let (mut positive, mut negative) = self.clipper.take_meshes();

        if positive.is_empty() || negative.is_empty() {
            // Only unreferenced vertices were on the far side
            let side = if positive.is_empty() {
                Side::Negative
            } else {
                Side::Positive
            };
            log::debug!("slice: one half is empty, whole mesh goes to the {:?} side", side);
            return Ok(whole(mesh, side, SliceOutcome::NoIntersection, first_vertex));
        }

        let cap = CapBuilder {
            normal: *plane.normal(),
            tolerance: self.config.effective_weld_tolerance(diagonal),
            mode: self.config.cap_mode,
            simplify: self.config.simplify_cap,
        }
        .build(&self.clipper.segments, &mut positive, &mut negative);

        let stats = self.clipper.stats;
        log::debug!(
            "slice: {} triangles split, {} coplanar, {} dropped, {} ring(s), {} cap triangles",
            stats.split,
            stats.coplanar,
            stats.dropped,
            cap.loops,
            cap.cap_triangles,
        );

        Ok(SliceResult::new(
            positive,
            negative,
            SliceOutcome::Intersected,
            cap,
            first_vertex,
        ))
    }
}

impl Default for MeshCutter {
    fn default() -> Self {
        Self::with_config(SliceConfig::default())
    }
}

/// Side a flat mesh lying in the plane belongs to: the one its faces point away from
fn facing_side(mesh: &Mesh, plane: &Plane) -> Side {
    let facing: f64 = mesh
        .triangles
        .iter()
        .map(|t| {
            let [a, b, c] = t.indices.map(|i| mesh.vertices[i].position);
            (b - a).cross(&(c - a)).dot(plane.normal())
        })
        .sum();
    if facing > 0.0 {
        Side::Negative
    } else {
        Side::Positive
    }
}

fn whole(
    mesh: &Mesh,
    side: Side,
    outcome: SliceOutcome,
    first_vertex: Option<Point3<f64>>,
) -> SliceResult {
    let (positive, negative) = match side {
        Side::Negative => (Mesh::new(), mesh.clone()),
        _ => (mesh.clone(), Mesh::new()),
    };
    SliceResult::new(positive, negative, outcome, CapReport::default(), first_vertex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SliceError;
    use crate::geometry::{is_watertight, Primitive, Triangle, Vertex};
    use nalgebra::{Vector2, Vector3};

    fn unit_cube() -> Mesh {
        Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh()
    }

    #[test]
    fn test_cube_through_center() {
        let mesh = unit_cube();
        let plane = Plane::new(Vector3::x(), 0.0).unwrap();
        let result = MeshCutter::default().slice(&mesh, &plane).unwrap();

        assert!(result.intersected());
        assert!(result.cap.is_closed());
        assert_eq!(result.cap.loops, 1);
        assert!((result.positive_volume - 0.5).abs() < 1e-9);
        assert!((result.negative_volume - 0.5).abs() < 1e-9);
        assert!(result.positive.vertices.iter().all(|v| v.position.x >= -1e-9));
        assert!(result.negative.vertices.iter().all(|v| v.position.x <= 1e-9));
    }

    #[test]
    fn test_plane_missing_the_mesh() {
        let mesh = unit_cube();
        let plane = Plane::new(Vector3::x(), 10.0).unwrap();
        let result = MeshCutter::default().slice(&mesh, &plane).unwrap();

        assert_eq!(result.outcome, SliceOutcome::NoIntersection);
        assert!(result.positive.is_empty());
        assert_eq!(result.negative, mesh);
        assert_eq!(result.first_vertex_side(&plane), Some(Side::Negative));
    }

    #[test]
    fn test_plane_through_face_is_not_an_intersection() {
        let mesh = unit_cube();
        let plane = Plane::new(Vector3::x(), 0.5).unwrap();
        let result = MeshCutter::default().slice(&mesh, &plane).unwrap();

        assert!(!result.intersected());
        assert_eq!(result.negative.triangle_count(), 12);
    }

    #[test]
    fn test_empty_mesh_is_degenerate() {
        let plane = Plane::new(Vector3::y(), 0.0).unwrap();
        let result = MeshCutter::default().slice(&Mesh::empty(), &plane).unwrap();

        assert_eq!(result.outcome, SliceOutcome::Degenerate);
        assert!(result.first_vertex.is_none());
    }

    #[test]
    fn test_flat_mesh_in_plane_goes_whole_to_one_side() {
        let mut mesh = Mesh::new();
        for p in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]] {
            mesh.add_vertex(Vertex::new(
                Point3::new(p[0], p[1], 0.0),
                Vector3::z(),
                Vector2::zeros(),
            ));
        }
        mesh.add_triangle(Triangle::new([0, 1, 2]));
        let plane = Plane::new(Vector3::z(), 0.0).unwrap();
        let result = MeshCutter::default().slice(&mesh, &plane).unwrap();

        assert_eq!(result.outcome, SliceOutcome::NoIntersection);
        assert!(!result.intersected());
        assert_eq!(result.negative.triangle_count(), 1);
        assert!(result.positive.is_empty());
    }

    #[test]
    fn test_bad_index_is_rejected() {
        let mut mesh = unit_cube();
        mesh.triangles[3].indices[1] = 99;
        let plane = Plane::new(Vector3::x(), 0.0).unwrap();

        let err = MeshCutter::default().slice(&mesh, &plane).unwrap_err();
        assert!(matches!(err, SliceError::IndexOutOfBounds { triangle: 3, index: 99, .. }));
    }

    #[test]
    fn test_sphere_halves_are_closed() {
        let mesh = Primitive::sphere(2.0, 24).to_mesh();
        let plane =
            Plane::from_point_normal(&Point3::new(0.0, 0.3, 0.0), &Vector3::new(0.2, 1.0, 0.1))
                .unwrap();
        // Simplification would leave T-junctions where quad diagonals cross the plane
        let mut cutter = MeshCutter::with_config(SliceConfig {
            cap_mode: crate::config::CapMode::Fan,
            simplify_cap: false,
            ..SliceConfig::default()
        });
        let result = cutter.slice(&mesh, &plane).unwrap();

        assert!(result.intersected());
        assert!(result.cap.is_closed());
        assert!(is_watertight(&result.positive));
        assert!(is_watertight(&result.negative));

        let total = result.positive_volume + result.negative_volume;
        assert!((total - volume(&mesh)).abs() < 1e-9 * volume(&mesh));
    }

    #[test]
    fn test_cutter_is_reusable() {
        let mesh = unit_cube();
        let plane = Plane::new(Vector3::new(1.0, 1.0, 0.0), 0.1).unwrap();
        let mut cutter = MeshCutter::new(64);

        let first = cutter.slice(&mesh, &plane).unwrap();
        let second = cutter.slice(&mesh, &plane).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_larger_side_by_area() {
        let mesh = unit_cube();
        let plane = Plane::new(Vector3::x(), 0.25).unwrap();
        let result = MeshCutter::default().slice(&mesh, &plane).unwrap();

        assert_eq!(result.larger_side(), Side::Negative);
        assert!(result.negative_area > result.positive_area);
    }
}
