// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convex hull of a slice piece, for building a convex collider

use crate::geometry::{signed_volume, Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector2, Vector3};
use parry3d::math::Point as ParryPoint;
use parry3d::transformation::try_convex_hull;

/// Convex hull of a piece, computed in single precision as physics engines store it
#[derive(Debug, Clone)]
pub struct ConvexHull {
    pub points: Vec<Point3<f64>>,
    pub indices: Vec<[u32; 3]>,
}

impl ConvexHull {
    /// Hull of the piece's vertices. `None` for fewer than four points or
    /// when the points are too degenerate to enclose a volume.
    pub fn from_mesh(mesh: &Mesh) -> Option<Self> {
        if mesh.vertex_count() < 4 {
            return None;
        }

        let points: Vec<ParryPoint<f32>> = mesh
            .vertices
            .iter()
            .map(|v| ParryPoint::new(v.position.x as f32, v.position.y as f32, v.position.z as f32))
            .collect();

        let (vertices, indices) = match try_convex_hull(&points) {
            Ok(hull) => hull,
            Err(err) => {
                log::warn!("convex hull failed: {:?}", err);
                return None;
            }
        };
        if indices.len() < 4 {
            return None;
        }

        Some(Self {
            points: vertices
                .iter()
                .map(|p| Point3::new(p.x as f64, p.y as f64, p.z as f64))
                .collect(),
            indices,
        })
    }

    /// Hull as a flat-shaded mesh with outward normals
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.points.len(), self.indices.len());
        for p in &self.points {
            mesh.add_vertex(Vertex::new(*p, Vector3::zeros(), Vector2::zeros()));
        }
        for tri in &self.indices {
            mesh.add_triangle(Triangle::new(tri.map(|i| i as usize)));
        }
        mesh.recompute_normals();
        mesh
    }

    pub fn volume(&self) -> f64 {
        signed_volume(&self.to_mesh()).abs()
    }
}
