// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL import and export

use crate::geometry::{Mesh, Triangle, Vertex};
use anyhow::{Context, Result};
use nalgebra::{Point3, Vector2, Vector3};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Read a binary or ASCII STL file.
///
/// Vertices shared between facets are kept shared, so slicing produces one
/// crossing per cut edge. Normals are recomputed from the faces and UVs are zero.
pub fn import_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let mut file = File::open(path).with_context(|| format!("Failed to open STL file: {:?}", path))?;
    let stl = stl_io::read_stl(&mut file).with_context(|| format!("Failed to read STL file: {:?}", path))?;

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.add_vertex(Vertex::new(
            Point3::new(v[0] as f64, v[1] as f64, v[2] as f64),
            Vector3::zeros(),
            Vector2::zeros(),
        ));
    }
    for face in &stl.faces {
        mesh.add_triangle(Triangle::new(face.vertices));
    }

    mesh.validate()
        .with_context(|| format!("Malformed STL file: {:?}", path))?;
    mesh.recompute_normals();
    log::info!(
        "Imported {:?}: {} vertices, {} triangles",
        path,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Export mesh to STL: binary for a `.stl` extension, ASCII otherwise
pub fn export_stl(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let binary = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"));

    if binary {
        export_stl_binary(mesh, path)
    } else {
        export_stl_ascii(mesh, path)
    }
}

fn face_normal(mesh: &Mesh, tri: &Triangle) -> Vector3<f64> {
    let [a, b, c] = tri.indices.map(|i| mesh.vertices[i].position);
    (b - a).cross(&(c - a)).try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
}

fn export_stl_binary(mesh: &Mesh, path: &Path) -> Result<()> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let to_stl = |p: &Point3<f64>| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]);
    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let normal = face_normal(mesh, tri);
            StlTriangle {
                normal: Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: tri.indices.map(|i| to_stl(&mesh.vertices[i].position)),
            }
        })
        .collect();

    let mut file = BufWriter::new(File::create(path).with_context(|| format!("Failed to create STL file: {:?}", path))?);
    stl_io::write_stl(&mut file, triangles.iter()).context("Failed to write STL file")?;
    file.flush().context("Failed to write STL file")?;

    Ok(())
}

fn export_stl_ascii(mesh: &Mesh, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path).with_context(|| format!("Failed to create STL file: {:?}", path))?);

    writeln!(file, "solid meshcut")?;

    for tri in &mesh.triangles {
        let normal = face_normal(mesh, tri);
        writeln!(file, "  facet normal {} {} {}", normal.x, normal.y, normal.z)?;
        writeln!(file, "    outer loop")?;
        for &i in &tri.indices {
            let p = mesh.vertices[i].position;
            writeln!(file, "      vertex {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(file, "    endloop")?;
        writeln!(file, "  endfacet")?;
    }

    writeln!(file, "endsolid meshcut")?;
    file.flush()?;

    Ok(())
}
