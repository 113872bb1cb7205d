// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Writing slice pieces to STL and reading them back

use anyhow::Result;
use approx::assert_relative_eq;
use meshcut::geometry::{analyze, volume};
use meshcut::{export_stl, import_stl, slice, split_pieces, MeshCutter, Plane, Primitive, SliceConfig};
use nalgebra::Vector3;
use tempfile::tempdir;

#[test]
fn test_halves_survive_binary_round_trip() -> Result<()> {
    let mesh = Primitive::cylinder(2.0, 1.0, 32).to_mesh();
    let result = slice(&mesh, &Plane::new(Vector3::new(1.0, 2.0, 0.0), 0.3)?)?;
    let dir = tempdir()?;

    for (name, half, expected) in [
        ("positive.stl", &result.positive, result.positive_volume),
        ("negative.stl", &result.negative, result.negative_volume),
    ] {
        let path = dir.path().join(name);
        export_stl(half, &path)?;
        let loaded = import_stl(&path)?;

        assert_eq!(loaded.triangle_count(), half.triangle_count());
        assert_relative_eq!(volume(&loaded), expected, max_relative = 1e-5);
    }
    Ok(())
}

#[test]
fn test_imported_mesh_can_be_sliced_again() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("sphere.stl");
    export_stl(&Primitive::sphere(1.0, 16).to_mesh(), &path)?;

    let mesh = import_stl(&path)?;
    let stats = analyze(&mesh);
    assert!(stats.is_watertight);

    let mut cutter = MeshCutter::with_config(SliceConfig::default());
    let pieces = split_pieces(&mut cutter, &[mesh], &Plane::new(Vector3::y(), 0.0)?)?;
    assert_eq!(pieces.positive.len(), 1);
    assert_eq!(pieces.negative.len(), 1);
    assert_relative_eq!(
        volume(&pieces.positive[0]) + volume(&pieces.negative[0]),
        stats.volume,
        max_relative = 1e-9
    );
    Ok(())
}
