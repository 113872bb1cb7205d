// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh buffer representation and utilities

use super::BoundingBox;
use crate::error::{Result, SliceError};
use nalgebra::{Matrix4, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
    pub uv: Vector2<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>, uv: Vector2<f64>) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Interpolate every attribute towards `other`. The normal is renormalized;
    /// if the two normals cancel out, this vertex's normal is kept.
    pub fn lerp(&self, other: &Vertex, t: f64) -> Vertex {
        let position = Point3::from(self.position.coords.lerp(&other.position.coords, t));
        let normal = self
            .normal
            .lerp(&other.normal, t)
            .try_normalize(1e-12)
            .unwrap_or(self.normal);
        let uv = self.uv.lerp(&other.uv, t);
        Vertex::new(position, normal, uv)
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        // Normals go through the inverse transpose
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        self.normal = normal_matrix
            .transform_vector(&self.normal)
            .try_normalize(1e-12)
            .unwrap_or(self.normal);
    }
}

/// Triangle defined by three vertex indices, tagged with the submesh it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
    #[serde(default)]
    pub submesh: usize,
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self {
            indices,
            submesh: 0,
        }
    }

    pub fn with_submesh(indices: [usize; 3], submesh: usize) -> Self {
        Self { indices, submesh }
    }
}

/// Triangular mesh buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Build a mesh from flat attribute buffers.
    ///
    /// `normals` and `uvs` must either match `positions` one to one or be
    /// empty. Missing normals are recomputed from the triangles, missing UVs
    /// default to zero.
    pub fn from_buffers(
        positions: &[Point3<f64>],
        normals: &[Vector3<f64>],
        uvs: &[Vector2<f64>],
        indices: &[u32],
    ) -> Result<Mesh> {
        let count = positions.len();
        if !normals.is_empty() && normals.len() != count {
            return Err(SliceError::AttributeMismatch {
                attribute: "normal",
                expected: count,
                found: normals.len(),
            });
        }
        if !uvs.is_empty() && uvs.len() != count {
            return Err(SliceError::AttributeMismatch {
                attribute: "uv",
                expected: count,
                found: uvs.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(SliceError::IndexCountNotMultipleOfThree(indices.len()));
        }

        let mut mesh = Mesh::with_capacity(count, indices.len() / 3);
        for (i, position) in positions.iter().enumerate() {
            let normal = normals.get(i).copied().unwrap_or_else(Vector3::zeros);
            let uv = uvs.get(i).copied().unwrap_or_else(Vector2::zeros);
            mesh.add_vertex(Vertex::new(*position, normal, uv));
        }
        for chunk in indices.chunks_exact(3) {
            mesh.add_triangle(Triangle::new([
                chunk[0] as usize,
                chunk[1] as usize,
                chunk[2] as usize,
            ]));
        }

        mesh.validate()?;
        if normals.is_empty() {
            mesh.recompute_normals();
        }
        Ok(mesh)
    }

    /// Check index ranges and position finiteness
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len();
        for (i, vertex) in self.vertices.iter().enumerate() {
            if !vertex.position.coords.iter().all(|c| c.is_finite()) {
                return Err(SliceError::NonFiniteVertex(i));
            }
        }
        for (triangle, tri) in self.triangles.iter().enumerate() {
            if let Some(&index) = tri.indices.iter().find(|&&idx| idx >= vertex_count) {
                return Err(SliceError::IndexOutOfBounds {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    pub fn normals(&self) -> Vec<Vector3<f64>> {
        self.vertices.iter().map(|v| v.normal).collect()
    }

    pub fn uvs(&self) -> Vec<Vector2<f64>> {
        self.vertices.iter().map(|v| v.uv).collect()
    }

    /// Flat index buffer, three entries per triangle
    pub fn indices(&self) -> Vec<u32> {
        self.triangles
            .iter()
            .flat_map(|t| t.indices.iter().map(|&i| i as u32))
            .collect()
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// Number of submeshes, i.e. one past the highest submesh tag in use
    pub fn submesh_count(&self) -> usize {
        self.triangles
            .iter()
            .map(|t| t.submesh + 1)
            .max()
            .unwrap_or(0)
    }

    /// Weld vertices whose positions are within epsilon distance of each other.
    /// Attributes of the first vertex in each cluster win.
    /// Returns the number of vertices removed
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut new_vertices: Vec<Vertex> = Vec::new();
        let mut new_indices: Vec<usize> = vec![0; original_count];

        for i in 0..original_count {
            let pos_i = self.vertices[i].position;
            match new_vertices
                .iter()
                .position(|v| (pos_i - v.position).norm() < epsilon)
            {
                Some(j) => new_indices[i] = j,
                None => {
                    new_indices[i] = new_vertices.len();
                    new_vertices.push(self.vertices[i]);
                }
            }
        }

        for triangle in &mut self.triangles {
            for idx in &mut triangle.indices {
                *idx = new_indices[*idx];
            }
        }

        self.vertices = new_vertices;
        original_count - self.vertices.len()
    }

    /// Recompute vertex normals from triangle geometry.
    /// Face normals are accumulated at shared vertices weighted by area.
    pub fn recompute_normals(&mut self) {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return;
        }

        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for triangle in &self.triangles {
            let v0 = &self.vertices[triangle.indices[0]];
            let v1 = &self.vertices[triangle.indices[1]];
            let v2 = &self.vertices[triangle.indices[2]];

            // Unnormalized cross product is already area weighted
            let face_normal = (v1.position - v0.position).cross(&(v2.position - v0.position));
            if face_normal.norm() > 1e-12 {
                for &idx in &triangle.indices {
                    normal_sums[idx] += face_normal;
                }
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(normal_sums) {
            vertex.normal = sum.try_normalize(1e-12).unwrap_or_else(Vector3::z);
        }
    }
}
