// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cross-section capping
//!
//! Ring segments arrive unordered, one per split triangle. Endpoints are
//! welded with a spatial hash, chained into loops, and every closed loop is
//! triangulated in the plane and appended to both halves with opposite
//! winding.

use super::clip::RingSegment;
use crate::config::CapMode;
use crate::geometry::{Mesh, Triangle, Vertex};
use ahash::{AHashMap, AHashSet};
use nalgebra::{Point2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Sine of the turning angle below which a ring point is considered collinear
const COLLINEAR_SINE: f64 = 1e-8;

/// What happened while closing the cross-section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapReport {
    /// Closed rings that were capped
    pub loops: usize,
    /// Chains that could not be closed; their part of the seam stays open
    pub open_chains: usize,
    /// Capped rings that were not convex
    pub non_convex_loops: usize,
    /// Cap triangles added to each half
    pub cap_triangles: usize,
}

impl CapReport {
    /// Every ring segment ended up in a closed, capped loop
    pub fn is_closed(&self) -> bool {
        self.open_chains == 0
    }
}

/// Welds nearby points into shared ids using a uniform grid
struct PointWelder {
    cells: AHashMap<(i64, i64, i64), Vec<usize>>,
    points: Vec<Point3<f64>>,
    cell_size: f64,
    tolerance: f64,
}

impl PointWelder {
    fn new(tolerance: f64) -> Self {
        let tolerance = tolerance.max(f64::MIN_POSITIVE);
        Self {
            cells: AHashMap::new(),
            points: Vec::new(),
            cell_size: tolerance * 2.0,
            tolerance,
        }
    }

    fn cell(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        let discretize = |v: f64| (v / self.cell_size).floor() as i64;
        (discretize(p.x), discretize(p.y), discretize(p.z))
    }

    fn insert(&mut self, point: Point3<f64>) -> usize {
        let (cx, cy, cz) = self.cell(&point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(ids) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        if let Some(&id) = ids
                            .iter()
                            .find(|&&id| (self.points[id] - point).norm() <= self.tolerance)
                        {
                            return id;
                        }
                    }
                }
            }
        }

        let id = self.points.len();
        self.points.push(point);
        self.cells.entry((cx, cy, cz)).or_default().push(id);
        id
    }
}

enum Chain {
    Closed(Vec<usize>),
    Open,
}

/// Walk undirected edges into chains. Each edge is used exactly once.
fn chain_edges(node_count: usize, edges: &[(usize, usize)]) -> Vec<Chain> {
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (e, &(a, b)) in edges.iter().enumerate() {
        incident[a].push(e);
        incident[b].push(e);
    }

    let mut used = vec![false; edges.len()];
    let mut chains = Vec::new();

    let next_edge = |node: usize, used: &mut Vec<bool>| -> Option<usize> {
        let e = *incident[node].iter().find(|&&e| !used[e])?;
        used[e] = true;
        let (a, b) = edges[e];
        Some(if a == node { b } else { a })
    };

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let (start, second) = edges[first];
        let mut path = vec![start, second];
        let mut reversed = false;

        loop {
            let tail = *path.last().unwrap_or(&start);
            if path.len() > 2 && tail == path[0] {
                path.pop();
                chains.push(Chain::Closed(path));
                break;
            }
            match next_edge(tail, &mut used) {
                Some(node) => path.push(node),
                None if !reversed => {
                    // Dead end: keep extending from the other end
                    path.reverse();
                    reversed = true;
                }
                None => {
                    chains.push(Chain::Open);
                    break;
                }
            }
        }
    }

    chains
}

/// Orthonormal in-plane axes `(u, v)` with `u × v = normal`
fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = normal.cross(&helper).normalize();
    let v = normal.cross(&u);
    (u, v)
}

fn cross2(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a - o).perp(&(b - o))
}

fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (p, q) = (points[i], points[(i + 1) % n]);
            p.x * q.y - q.x * p.y
        })
        .sum::<f64>()
        / 2.0
}

/// Drop ring points where the boundary does not turn
fn simplify(ring: &mut Vec<usize>, points: &[Point2<f64>]) {
    let mut changed = true;
    while changed && ring.len() > 3 {
        changed = false;
        for i in 0..ring.len() {
            let n = ring.len();
            let prev = &points[ring[(i + n - 1) % n]];
            let cur = &points[ring[i]];
            let next = &points[ring[(i + 1) % n]];
            let scale = (cur - prev).norm() * (next - cur).norm();
            if cross2(prev, cur, next).abs() <= COLLINEAR_SINE * scale {
                ring.remove(i);
                changed = true;
                break;
            }
        }
    }
}

/// Counter-clockwise ring with no reflex corner; straight corners are allowed
fn is_convex(ring: &[usize], points: &[Point2<f64>]) -> bool {
    let n = ring.len();
    (0..n).all(|i| {
        let prev = &points[ring[(i + n - 1) % n]];
        let cur = &points[ring[i]];
        let next = &points[ring[(i + 1) % n]];
        let scale = (cur - prev).norm() * (next - cur).norm();
        cross2(prev, cur, next) >= -COLLINEAR_SINE * scale
    })
}

fn fan(ring: &[usize]) -> Vec<[usize; 3]> {
    (1..ring.len().saturating_sub(1))
        .map(|i| [ring[0], ring[i], ring[i + 1]])
        .collect()
}

fn inside_triangle(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
    cross2(a, b, p) >= 0.0 && cross2(b, c, p) >= 0.0 && cross2(c, a, p) >= 0.0
}

/// Ear clipping of a counter-clockwise simple polygon.
/// Returns `None` when no ear can be found, which means the ring self-intersects.
fn ear_clip(ring: &[usize], points: &[Point2<f64>]) -> Option<Vec<[usize; 3]>> {
    let mut remaining = ring.to_vec();
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));

    while remaining.len() > 3 {
        let n = remaining.len();
        let ear = (0..n).find(|&i| {
            let (ia, ib, ic) = (remaining[(i + n - 1) % n], remaining[i], remaining[(i + 1) % n]);
            let (a, b, c) = (&points[ia], &points[ib], &points[ic]);
            if cross2(a, b, c) <= 0.0 {
                return false;
            }
            !remaining
                .iter()
                .filter(|&&other| other != ia && other != ib && other != ic)
                .any(|&other| inside_triangle(&points[other], a, b, c))
        })?;

        triangles.push([remaining[(ear + n - 1) % n], remaining[ear], remaining[(ear + 1) % n]]);
        remaining.remove(ear);
    }

    if remaining.len() == 3 {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    }
    Some(triangles)
}

/// Closes the cross-section of one slice
pub(crate) struct CapBuilder {
    pub normal: Vector3<f64>,
    pub tolerance: f64,
    pub mode: CapMode,
    pub simplify: bool,
}

impl CapBuilder {
    /// Chain `segments` into rings and append cap triangles to both halves.
    /// The negative half is capped facing `+normal`, the positive half facing `-normal`.
    /// Segments are welded together whatever their submesh; a ring's cap triangles take
    /// the lowest submesh tag among the segments it was chained from.
    pub fn build(&self, segments: &[RingSegment], positive: &mut Mesh, negative: &mut Mesh) -> CapReport {
        let mut report = CapReport::default();

        let mut welder = PointWelder::new(self.tolerance);
        // Lowest submesh tag among the segments touching each welded point
        let mut point_submesh: Vec<usize> = Vec::new();
        let mut seen = AHashSet::new();
        let mut edges = Vec::new();
        for segment in segments {
            let a = welder.insert(segment.start);
            let b = welder.insert(segment.end);
            point_submesh.resize(welder.points.len(), usize::MAX);
            for id in [a, b] {
                point_submesh[id] = point_submesh[id].min(segment.submesh);
            }
            if a != b && seen.insert((a.min(b), a.max(b))) {
                edges.push((a, b));
            }
        }

        for chain in chain_edges(welder.points.len(), &edges) {
            match chain {
                Chain::Closed(ring) => {
                    let submesh = ring.iter().map(|&i| point_submesh[i]).min().unwrap_or(0);
                    self.cap_ring(ring, &welder.points, submesh, positive, negative, &mut report)
                }
                Chain::Open => report.open_chains += 1,
            }
        }

        if !report.is_closed() {
            log::warn!(
                "cap incomplete: {} open ring chain(s), the seam stays open",
                report.open_chains
            );
        }
        report
    }

    fn cap_ring(
        &self,
        mut ring: Vec<usize>,
        points3: &[Point3<f64>],
        submesh: usize,
        positive: &mut Mesh,
        negative: &mut Mesh,
        report: &mut CapReport,
    ) {
        let (u, v) = plane_basis(&self.normal);
        let points: Vec<Point2<f64>> = points3
            .iter()
            .map(|p| Point2::new(p.coords.dot(&u), p.coords.dot(&v)))
            .collect();

        if self.simplify {
            simplify(&mut ring, &points);
        }
        if ring.len() < 3 {
            return;
        }

        let ring_points: Vec<Point2<f64>> = ring.iter().map(|&i| points[i]).collect();
        let area = signed_area(&ring_points);
        if area.abs() <= self.tolerance * self.tolerance {
            return;
        }
        if area < 0.0 {
            ring.reverse();
        }

        let convex = is_convex(&ring, &points);
        if !convex {
            report.non_convex_loops += 1;
            log::warn!("non-convex cross-section ring with {} points", ring.len());
        }

        let triangles = match (self.mode, convex) {
            (CapMode::Fan, _) | (CapMode::Auto, true) => fan(&ring),
            (CapMode::EarClip, _) | (CapMode::Auto, false) => ear_clip(&ring, &points).unwrap_or_else(|| {
                log::warn!("self-intersecting cross-section ring, falling back to a fan");
                fan(&ring)
            }),
        };

        // Planar UVs over the ring bounds, aspect preserved
        let (mut min, mut max) = (ring_points[0], ring_points[0]);
        for p in &ring_points {
            min = min.inf(p);
            max = max.sup(p);
        }
        let extent = (max - min).amax().max(f64::MIN_POSITIVE);
        let uv_of = |i: usize| -> Vector2<f64> { (points[i] - min) / extent };

        let mut local_negative = AHashMap::new();
        let mut local_positive = AHashMap::new();
        for &i in &ring {
            local_negative.insert(
                i,
                negative.add_vertex(Vertex::new(points3[i], self.normal, uv_of(i))),
            );
            local_positive.insert(
                i,
                positive.add_vertex(Vertex::new(points3[i], -self.normal, uv_of(i))),
            );
        }

        for [a, b, c] in &triangles {
            negative.add_triangle(Triangle::with_submesh(
                [local_negative[a], local_negative[b], local_negative[c]],
                submesh,
            ));
            positive.add_triangle(Triangle::with_submesh(
                [local_positive[a], local_positive[c], local_positive[b]],
                submesh,
            ));
        }

        report.loops += 1;
        report.cap_triangles += triangles.len();
    }
}
