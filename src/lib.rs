// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshcut
//!
//! Runtime plane slicing of triangle meshes. A mesh is cut by an infinite
//! plane into a positive and a negative half, each closed with cap
//! triangles along the cross-section, with vertex attributes interpolated
//! across the cut.

pub mod collider;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod scheduler;
pub mod slice;

pub use collider::ConvexHull;
pub use config::{CapMode, SliceConfig};
pub use error::{Result, SliceError};
pub use geometry::{Mesh, Plane, Primitive, Side, Triangle, Vertex};
pub use io::{export_stl, import_stl};
pub use scheduler::{slice_parallel, split_pieces, PieceSplit, SliceJob, SliceQueue};
pub use slice::{CapReport, MeshCutter, SliceOutcome, SliceResult};

/// Cut `mesh` with `plane` using default settings.
///
/// Allocates fresh scratch buffers; keep a [`MeshCutter`] around when
/// slicing repeatedly.
pub fn slice(mesh: &Mesh, plane: &Plane) -> Result<SliceResult> {
    MeshCutter::default().slice(mesh, plane)
}
