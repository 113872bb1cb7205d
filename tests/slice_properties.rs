// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Invariants that must hold for any plane through a closed mesh

use anyhow::Result;
use approx::assert_relative_eq;
use meshcut::geometry::{surface_area, volume};
use meshcut::{Mesh, MeshCutter, Plane, Primitive, SliceOutcome};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPSILON: f64 = 1e-5;

fn solids() -> Vec<(&'static str, Mesh)> {
    vec![
        ("cube", Primitive::cube(Vector3::new(2.0, 1.0, 0.5), true).to_mesh()),
        ("indexed_cube", Primitive::indexed_cube(Vector3::new(1.0, 1.0, 1.0)).to_mesh()),
        ("sphere", Primitive::sphere(1.0, 16).to_mesh()),
        ("cylinder", Primitive::cylinder(2.0, 0.5, 24).to_mesh()),
    ]
}

/// Random plane through a point inside the mesh bounds
fn random_plane(rng: &mut StdRng, mesh: &Mesh) -> Plane {
    let bbox = mesh.bounding_box();
    let center = bbox.center();
    let size = bbox.size() * 0.4;
    let point = Point3::new(
        center.x + rng.gen_range(-1.0..1.0) * size.x,
        center.y + rng.gen_range(-1.0..1.0) * size.y,
        center.z + rng.gen_range(-1.0..1.0) * size.z,
    );
    loop {
        let normal = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if normal.norm() > 0.1 {
            if let Ok(plane) = Plane::from_point_normal(&point, &normal) {
                return plane;
            }
        }
    }
}

#[test]
fn test_volume_is_conserved() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut cutter = MeshCutter::default();

    for (name, mesh) in solids() {
        let total = volume(&mesh);
        for _ in 0..25 {
            let plane = random_plane(&mut rng, &mesh);
            let result = cutter.slice(&mesh, &plane)?;
            if !result.intersected() {
                continue;
            }

            assert!(result.cap.is_closed(), "{}: open cap for {:?}", name, plane);
            assert_relative_eq!(
                result.positive_volume + result.negative_volume,
                total,
                max_relative = 1e-7
            );
        }
    }
    Ok(())
}

#[test]
fn test_halves_stay_on_their_side() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(11);
    let mut cutter = MeshCutter::default();

    for (_, mesh) in solids() {
        let epsilon = EPSILON * mesh.bounding_box().diagonal().max(1.0);
        for _ in 0..25 {
            let plane = random_plane(&mut rng, &mesh);
            let result = cutter.slice(&mesh, &plane)?;

            for v in &result.positive.vertices {
                assert!(plane.signed_distance(&v.position) >= -epsilon);
            }
            for v in &result.negative.vertices {
                assert!(plane.signed_distance(&v.position) <= epsilon);
            }
        }
    }
    Ok(())
}

#[test]
fn test_caps_face_away_from_their_half() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(23);
    let mut cutter = MeshCutter::default();

    for (_, mesh) in solids() {
        for _ in 0..10 {
            let plane = random_plane(&mut rng, &mesh);
            let result = cutter.slice(&mesh, &plane)?;
            let count = result.cap.cap_triangles;

            for (half, sign) in [(&result.negative, 1.0), (&result.positive, -1.0)] {
                for tri in &half.triangles[half.triangle_count() - count..] {
                    let [a, b, c] = tri.indices.map(|i| half.vertices[i].position);
                    let face = (b - a).cross(&(c - a));
                    assert!(face.dot(plane.normal()) * sign > 0.0);
                }
            }
            // Both caps cover the same area
            if count > 0 {
                let cap_area = |half: &Mesh| {
                    let mut cap = Mesh::new();
                    cap.vertices = half.vertices.clone();
                    cap.triangles = half.triangles[half.triangle_count() - count..].to_vec();
                    surface_area(&cap)
                };
                assert_relative_eq!(
                    cap_area(&result.positive),
                    cap_area(&result.negative),
                    max_relative = 1e-12
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_reslicing_a_half_is_a_no_op() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(31);
    let mut cutter = MeshCutter::default();

    for (_, mesh) in solids() {
        let plane = random_plane(&mut rng, &mesh);
        let first = cutter.slice(&mesh, &plane)?;
        if !first.intersected() {
            continue;
        }

        let again = cutter.slice(&first.positive, &plane)?;
        assert_eq!(again.outcome, SliceOutcome::NoIntersection);
        assert_eq!(again.positive, first.positive);
        assert!(again.negative.is_empty());
    }
    Ok(())
}

#[test]
fn test_flipped_plane_swaps_the_halves() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(43);
    let mut cutter = MeshCutter::default();

    for (_, mesh) in solids() {
        let plane = random_plane(&mut rng, &mesh);
        let result = cutter.slice(&mesh, &plane)?;
        let flipped = cutter.slice(&mesh, &plane.flipped())?;

        assert_eq!(result.outcome, flipped.outcome);
        assert_relative_eq!(result.positive_volume, flipped.negative_volume, max_relative = 1e-9);
        assert_relative_eq!(result.negative_volume, flipped.positive_volume, max_relative = 1e-9);
    }
    Ok(())
}

#[test]
fn test_input_is_not_modified() -> Result<()> {
    let mesh = Primitive::sphere(1.0, 12).to_mesh();
    let copy = mesh.clone();
    let plane = Plane::new(Vector3::new(1.0, 1.0, 1.0), 0.1)?;

    MeshCutter::default().slice(&mesh, &plane)?;
    assert_eq!(mesh, copy);
    Ok(())
}
