// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! Every primitive is wound counter-clockwise when seen from outside, so
//! face normals point outward and signed volumes come out positive.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector2, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
pub enum Primitive {
    /// Flat-shaded cube, four vertices per face
    Cube { size: Vector3<f64>, center: bool },
    /// Centered cube with eight shared corner vertices and twelve triangles
    IndexedCube { size: Vector3<f64> },
    Sphere { r: f64, fn_: u32 },
    Cylinder { h: f64, r: f64, fn_: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn indexed_cube(size: Vector3<f64>) -> Self {
        Self::IndexedCube { size }
    }

    pub fn sphere(r: f64, fn_: u32) -> Self {
        let segments = if fn_ > 2 { fn_ } else { 32 };
        Self::Sphere { r, fn_: segments }
    }

    pub fn cylinder(h: f64, r: f64, fn_: u32) -> Self {
        let segments = if fn_ > 2 { fn_ } else { 32 };
        Self::Cylinder {
            h,
            r,
            fn_: segments,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::IndexedCube { size } => generate_indexed_cube_mesh(*size),
            Self::Sphere { r, fn_ } => generate_sphere_mesh(*r, *fn_),
            Self::Cylinder { h, r, fn_ } => generate_cylinder_mesh(*h, *r, *fn_),
        }
    }
}

fn cube_extents(size: Vector3<f64>, center: bool) -> (Point3<f64>, Point3<f64>) {
    if center {
        (Point3::from(-size / 2.0), Point3::from(size / 2.0))
    } else {
        (Point3::origin(), Point3::from(size))
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let (lo, hi) = cube_extents(size, center);
    let corner = |x: bool, y: bool, z: bool| {
        Point3::new(
            if x { hi.x } else { lo.x },
            if y { hi.y } else { lo.y },
            if z { hi.z } else { lo.z },
        )
    };

    // Each face lists its corners counter-clockwise as seen from outside
    let faces = [
        (
            Vector3::x(),
            [corner(true, false, false), corner(true, true, false), corner(true, true, true), corner(true, false, true)],
        ),
        (
            -Vector3::x(),
            [corner(false, false, false), corner(false, false, true), corner(false, true, true), corner(false, true, false)],
        ),
        (
            Vector3::y(),
            [corner(false, true, false), corner(false, true, true), corner(true, true, true), corner(true, true, false)],
        ),
        (
            -Vector3::y(),
            [corner(false, false, false), corner(true, false, false), corner(true, false, true), corner(false, false, true)],
        ),
        (
            Vector3::z(),
            [corner(false, false, true), corner(true, false, true), corner(true, true, true), corner(false, true, true)],
        ),
        (
            -Vector3::z(),
            [corner(false, false, false), corner(false, true, false), corner(true, true, false), corner(true, false, false)],
        ),
    ];
    let face_uvs = [
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(1.0, 1.0),
        Vector2::new(0.0, 1.0),
    ];

    let mut mesh = Mesh::with_capacity(24, 12);
    for (normal, corners) in faces {
        let base = mesh.vertex_count();
        for (position, uv) in corners.iter().zip(face_uvs) {
            mesh.add_vertex(Vertex::new(*position, normal, uv));
        }
        mesh.add_triangle(Triangle::new([base, base + 1, base + 2]));
        mesh.add_triangle(Triangle::new([base, base + 2, base + 3]));
    }

    mesh
}

fn generate_indexed_cube_mesh(size: Vector3<f64>) -> Mesh {
    let half = size / 2.0;
    let mut mesh = Mesh::with_capacity(8, 12);

    // Corner index bits: 1 = +x, 2 = +y, 4 = +z
    for i in 0..8 {
        let sign = Vector3::new(
            if i & 1 != 0 { 1.0 } else { -1.0 },
            if i & 2 != 0 { 1.0 } else { -1.0 },
            if i & 4 != 0 { 1.0 } else { -1.0 },
        );
        let position = Point3::from(half.component_mul(&sign));
        let uv = Vector2::new((sign.x + 1.0) / 2.0, (sign.y + 1.0) / 2.0);
        mesh.add_vertex(Vertex::new(position, sign.normalize(), uv));
    }

    let triangles = [
        [1, 3, 7], [1, 7, 5], // +x
        [0, 4, 6], [0, 6, 2], // -x
        [2, 6, 7], [2, 7, 3], // +y
        [0, 1, 5], [0, 5, 4], // -y
        [4, 5, 7], [4, 7, 6], // +z
        [0, 2, 3], [0, 3, 1], // -z
    ];
    for indices in triangles {
        mesh.add_triangle(Triangle::new(indices));
    }

    mesh
}

fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let stacks = segments as usize;
    let slices = segments as usize;
    let mut mesh = Mesh::with_capacity((stacks + 1) * (slices + 1), 2 * stacks * slices);

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            let normal = Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            let uv = Vector2::new(j as f64 / slices as f64, i as f64 / stacks as f64);
            mesh.add_vertex(Vertex::new(Point3::from(normal * radius), normal, uv));
        }
    }

    let index = |i: usize, j: usize| i * (slices + 1) + j;
    for i in 0..stacks {
        for j in 0..slices {
            let a = index(i, j);
            let b = index(i + 1, j);
            let c = index(i + 1, j + 1);
            let d = index(i, j + 1);

            // The pole rows would otherwise produce zero-area triangles
            if i != 0 {
                mesh.add_triangle(Triangle::new([a, d, b]));
            }
            if i != stacks - 1 {
                mesh.add_triangle(Triangle::new([d, c, b]));
            }
        }
    }

    mesh
}

fn generate_cylinder_mesh(height: f64, radius: f64, segments: u32) -> Mesh {
    let segments = segments as usize;
    let mut mesh = Mesh::with_capacity(4 * (segments + 1) + 2, 4 * segments);
    let (y0, y1) = (-height / 2.0, height / 2.0);

    // Side wall, seam column duplicated for UV continuity
    for j in 0..=segments {
        let theta = 2.0 * PI * j as f64 / segments as f64;
        let normal = Vector3::new(theta.cos(), 0.0, theta.sin());
        let u = j as f64 / segments as f64;
        mesh.add_vertex(Vertex::new(
            Point3::new(radius * normal.x, y0, radius * normal.z),
            normal,
            Vector2::new(u, 0.0),
        ));
        mesh.add_vertex(Vertex::new(
            Point3::new(radius * normal.x, y1, radius * normal.z),
            normal,
            Vector2::new(u, 1.0),
        ));
    }
    for j in 0..segments {
        let a = 2 * j;
        let b = a + 1;
        let c = a + 3;
        let d = a + 2;
        mesh.add_triangle(Triangle::new([a, b, d]));
        mesh.add_triangle(Triangle::new([b, c, d]));
    }

    // End caps as fans around a center vertex
    for (y, normal) in [(y1, Vector3::y()), (y0, -Vector3::y())] {
        let center = mesh.add_vertex(Vertex::new(
            Point3::new(0.0, y, 0.0),
            normal,
            Vector2::new(0.5, 0.5),
        ));
        let ring_start = mesh.vertex_count();
        for j in 0..segments {
            let theta = 2.0 * PI * j as f64 / segments as f64;
            let (cos, sin) = (theta.cos(), theta.sin());
            mesh.add_vertex(Vertex::new(
                Point3::new(radius * cos, y, radius * sin),
                normal,
                Vector2::new(0.5 + cos / 2.0, 0.5 + sin / 2.0),
            ));
        }
        for j in 0..segments {
            let p = ring_start + j;
            let q = ring_start + (j + 1) % segments;
            if normal.y > 0.0 {
                mesh.add_triangle(Triangle::new([center, q, p]));
            } else {
                mesh.add_triangle(Triangle::new([center, p, q]));
            }
        }
    }

    mesh
}
