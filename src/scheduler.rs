// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Spreading slice work over frames and threads
//!
//! A slice is never suspended half way: [`SliceQueue::tick`] runs whole jobs
//! up to its quota, and [`slice_parallel`] gives every rayon worker its own
//! [`MeshCutter`].

use crate::config::SliceConfig;
use crate::error::Result;
use crate::geometry::{Mesh, Plane, Side};
use crate::slice::{MeshCutter, SliceResult};
use rayon::prelude::*;
use std::collections::VecDeque;

/// A mesh waiting to be cut, tagged with a caller-chosen key
#[derive(Debug, Clone)]
pub struct SliceJob<K> {
    pub key: K,
    pub mesh: Mesh,
    pub plane: Plane,
}

impl<K> SliceJob<K> {
    pub fn new(key: K, mesh: Mesh, plane: Plane) -> Self {
        Self { key, mesh, plane }
    }
}

/// FIFO of slice jobs drained a few at a time
#[derive(Debug)]
pub struct SliceQueue<K> {
    jobs: VecDeque<SliceJob<K>>,
    per_tick: usize,
}

impl<K> SliceQueue<K> {
    /// Queue running at most `per_tick` jobs per [`tick`](Self::tick); zero is treated as one
    pub fn new(per_tick: usize) -> Self {
        Self {
            jobs: VecDeque::new(),
            per_tick: per_tick.max(1),
        }
    }

    pub fn from_config(config: &SliceConfig) -> Self {
        Self::new(config.max_slices_per_tick)
    }

    pub fn push(&mut self, key: K, mesh: Mesh, plane: Plane) {
        self.jobs.push_back(SliceJob::new(key, mesh, plane));
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn per_tick(&self) -> usize {
        self.per_tick
    }

    /// Run up to the per-tick quota of jobs, oldest first
    pub fn tick(&mut self, cutter: &mut MeshCutter) -> Vec<(K, Result<SliceResult>)> {
        let count = self.per_tick.min(self.jobs.len());
        let results: Vec<_> = self
            .jobs
            .drain(..count)
            .map(|job| {
                let result = cutter.slice(&job.mesh, &job.plane);
                (job.key, result)
            })
            .collect();

        if !results.is_empty() {
            log::debug!("tick: {} slice(s) done, {} queued", results.len(), self.jobs.len());
        }
        results
    }

    /// Tick until the queue is empty
    pub fn drain(&mut self, cutter: &mut MeshCutter) -> Vec<(K, Result<SliceResult>)> {
        let mut results = Vec::with_capacity(self.jobs.len());
        while !self.is_empty() {
            results.extend(self.tick(cutter));
        }
        results
    }
}

/// Slice a batch on the rayon pool, one cutter per worker. Results keep input order.
pub fn slice_parallel<K: Send>(
    jobs: Vec<SliceJob<K>>,
    config: &SliceConfig,
) -> Vec<(K, Result<SliceResult>)> {
    jobs.into_par_iter()
        .map_init(
            || MeshCutter::with_config(config.clone()),
            |cutter, job| {
                let result = cutter.slice(&job.mesh, &job.plane);
                (job.key, result)
            },
        )
        .collect()
}

/// Pieces sorted onto the two sides of a plane
#[derive(Debug, Clone, Default)]
pub struct PieceSplit {
    pub positive: Vec<Mesh>,
    pub negative: Vec<Mesh>,
}

impl PieceSplit {
    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All pieces, positive side first
    pub fn into_pieces(self) -> Vec<Mesh> {
        let mut pieces = self.positive;
        pieces.extend(self.negative);
        pieces
    }
}

/// Cut every piece with `plane`.
///
/// Intersected pieces contribute both halves. A piece the plane misses goes
/// whole to the side of its first vertex; empty pieces are dropped.
pub fn split_pieces(cutter: &mut MeshCutter, pieces: &[Mesh], plane: &Plane) -> Result<PieceSplit> {
    let mut split = PieceSplit::default();

    for piece in pieces {
        let result = cutter.slice(piece, plane)?;
        if result.intersected() {
            let (positive, negative) = result.into_meshes();
            split.positive.push(positive);
            split.negative.push(negative);
            continue;
        }

        match result.first_vertex_side(plane) {
            Some(Side::Negative) => split.negative.push(piece.clone()),
            Some(_) => split.positive.push(piece.clone()),
            None => {}
        }
    }

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::{Matrix4, Vector3};

    fn cube_at(x: f64) -> Mesh {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh();
        mesh.transform(&Matrix4::new_translation(&Vector3::new(x, 0.0, 0.0)));
        mesh
    }

    #[test]
    fn test_queue_respects_quota() {
        let plane = Plane::new(Vector3::x(), 0.0).unwrap();
        let mut queue = SliceQueue::new(2);
        for key in 0..5 {
            queue.push(key, cube_at(0.0), plane);
        }
        let mut cutter = MeshCutter::default();

        let first = queue.tick(&mut cutter);
        assert_eq!(first.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(queue.len(), 3);

        let rest = queue.drain(&mut cutter);
        assert_eq!(rest.len(), 3);
        assert!(queue.is_empty());
        assert!(queue.tick(&mut cutter).is_empty());
    }

    #[test]
    fn test_zero_quota_still_progresses() {
        let queue: SliceQueue<u32> = SliceQueue::new(0);
        assert_eq!(queue.per_tick(), 1);
    }

    #[test]
    fn test_queue_quota_from_config() {
        let config = SliceConfig {
            max_slices_per_tick: 3,
            ..SliceConfig::default()
        };
        let mut queue = SliceQueue::from_config(&config);
        assert_eq!(queue.per_tick(), 3);

        for i in 0..4 {
            queue.push(i, cube_at(0.0), Plane::new(Vector3::x(), 0.0).unwrap());
        }
        let mut cutter = MeshCutter::with_config(config);
        assert_eq!(queue.tick(&mut cutter).len(), 3);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let plane = Plane::new(Vector3::new(1.0, 0.5, 0.0), 0.1).unwrap();
        let jobs: Vec<_> = (0..8)
            .map(|i| SliceJob::new(i, cube_at(i as f64 * 0.1), plane))
            .collect();

        let config = SliceConfig::default();
        let parallel = slice_parallel(jobs.clone(), &config);
        let mut cutter = MeshCutter::with_config(config);

        for ((key, result), job) in parallel.into_iter().zip(&jobs) {
            assert_eq!(key, job.key);
            assert_eq!(result.unwrap(), cutter.slice(&job.mesh, &job.plane).unwrap());
        }
    }

    #[test]
    fn test_split_pieces_sorts_uncut_pieces() {
        let plane = Plane::new(Vector3::x(), 0.0).unwrap();
        let pieces = vec![cube_at(0.0), cube_at(5.0), cube_at(-5.0), Mesh::empty()];
        let mut cutter = MeshCutter::default();

        let split = split_pieces(&mut cutter, &pieces, &plane).unwrap();
        assert_eq!(split.positive.len(), 2);
        assert_eq!(split.negative.len(), 2);
        assert_eq!(split.negative[1], pieces[2]);
        assert_eq!(split.into_pieces().len(), 4);
    }
}
