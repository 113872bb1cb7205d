// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::Mesh;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Welding tolerance used when checking whether a triangle soup is closed
const WATERTIGHT_WELD_EPSILON: f64 = 1e-7;

/// Geometry statistics and analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Enclosed volume in cubic units
    pub volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Vertex centroid [x, y, z]
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Every edge, after welding coincident positions, is shared by exactly two triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            is_watertight: false,
        }
    }

    /// Pretty print statistics
    pub fn print(&self) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║              GEOMETRY ANALYTICS                          ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║ Volume:          {:>12.6}                            ║", self.volume);
        println!("║ Surface Area:    {:>12.6}                            ║", self.surface_area);
        println!(
            "║ Centroid:        ({:>8.3}, {:>8.3}, {:>8.3})           ║",
            self.centroid[0], self.centroid[1], self.centroid[2]
        );
        println!("║                                                          ║");
        println!(
            "║   Min: ({:>8.3}, {:>8.3}, {:>8.3})                     ║",
            self.bbox[0], self.bbox[1], self.bbox[2]
        );
        println!(
            "║   Max: ({:>8.3}, {:>8.3}, {:>8.3})                     ║",
            self.bbox[3], self.bbox[4], self.bbox[5]
        );
        println!("║                                                          ║");
        println!("║ Vertices:        {:>10}                              ║", self.vertex_count);
        println!("║ Triangles:       {:>10}                              ║", self.triangle_count);
        println!(
            "║ Watertight:      {:>10}                              ║",
            if self.is_watertight { "Yes" } else { "No" }
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    if mesh.is_empty() {
        return GeometryStats::empty();
    }

    let bbox = mesh.bounding_box();
    GeometryStats {
        volume: volume(mesh),
        surface_area: surface_area(mesh),
        bbox: [
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z,
        ],
        centroid: calculate_centroid(mesh),
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        is_watertight: is_watertight(mesh),
    }
}

/// Signed volume enclosed by the mesh (positive for outward winding).
/// Only meaningful for closed meshes.
pub fn signed_volume(mesh: &Mesh) -> f64 {
    // Tetrahedra are spanned from the first vertex rather than the origin
    // to keep the sum well conditioned for meshes far from the origin.
    let Some(apex) = mesh.vertices.first().map(|v| v.position) else {
        return 0.0;
    };

    mesh.triangles
        .iter()
        .map(|triangle| {
            let v0 = mesh.vertices[triangle.indices[0]].position - apex;
            let v1 = mesh.vertices[triangle.indices[1]].position - apex;
            let v2 = mesh.vertices[triangle.indices[2]].position - apex;
            v0.dot(&v1.cross(&v2)) / 6.0
        })
        .sum()
}

/// Enclosed volume, independent of winding direction
pub fn volume(mesh: &Mesh) -> f64 {
    signed_volume(mesh).abs()
}

/// Total surface area
pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let v0 = mesh.vertices[triangle.indices[0]].position;
            let v1 = mesh.vertices[triangle.indices[1]].position;
            let v2 = mesh.vertices[triangle.indices[2]].position;
            (v1 - v0).cross(&(v2 - v0)).norm() / 2.0
        })
        .sum()
}

/// Calculate centroid of the vertex positions
fn calculate_centroid(mesh: &Mesh) -> [f64; 3] {
    let sum = mesh
        .vertices
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.position.coords);
    let mean = sum / mesh.vertices.len() as f64;
    [mean.x, mean.y, mean.z]
}

/// Check if mesh is watertight (manifold).
/// Coincident positions are welded first so that attribute seams do not
/// count as open edges; zero-length edges are ignored.
pub fn is_watertight(mesh: &Mesh) -> bool {
    if mesh.is_empty() {
        return false;
    }

    let mut welded = mesh.clone();
    welded.weld_vertices(WATERTIGHT_WELD_EPSILON);

    let mut edge_count: AHashMap<(usize, usize), usize> = AHashMap::new();
    for triangle in &welded.triangles {
        let indices = &triangle.indices;
        for i in 0..3 {
            let v1 = indices[i];
            let v2 = indices[(i + 1) % 3];
            if v1 == v2 {
                continue;
            }
            let edge = if v1 < v2 { (v1, v2) } else { (v2, v1) };
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }

    edge_count.values().all(|&count| count == 2)
}
