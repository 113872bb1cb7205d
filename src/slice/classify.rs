// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-vertex signed distances and half-space tags

use crate::geometry::{Mesh, Plane, Side};

/// Scratch buffers filled once per slice
#[derive(Debug, Default)]
pub(crate) struct Classification {
    pub distances: Vec<f64>,
    pub sides: Vec<Side>,
    pub positive: usize,
    pub negative: usize,
    /// Vertices inside the epsilon band, whose distance was snapped to zero
    pub on_plane: usize,
}

impl Classification {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            distances: Vec::with_capacity(capacity),
            sides: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Both strict sides are populated, so at least one triangle may straddle
    pub fn spans_plane(&self) -> bool {
        self.positive > 0 && self.negative > 0
    }
}

/// Classify every vertex of `mesh` against `plane`.
///
/// Returns `false` when the mesh has no vertices. Distances inside the band
/// are snapped to exactly zero so that no crossing is ever computed on them.
pub(crate) fn classify_vertices(
    mesh: &Mesh,
    plane: &Plane,
    epsilon: f64,
    out: &mut Classification,
) -> bool {
    out.distances.clear();
    out.sides.clear();
    out.positive = 0;
    out.negative = 0;
    out.on_plane = 0;

    if mesh.vertices.is_empty() {
        return false;
    }

    for vertex in &mesh.vertices {
        let distance = plane.signed_distance(&vertex.position);
        let side = Side::from_distance(distance, epsilon);
        match side {
            Side::Positive => out.positive += 1,
            Side::Negative => out.negative += 1,
            Side::OnPlane => out.on_plane += 1,
        }
        out.distances
            .push(if side == Side::OnPlane { 0.0 } else { distance });
        out.sides.push(side);
    }

    true
}
