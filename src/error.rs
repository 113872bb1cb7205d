// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Errors raised for input that cannot be sliced at all.
//!
//! Geometric anomalies (a plane that misses the mesh, an open cap, a
//! concave ring) are not errors; they are reported on the slice result.

use thiserror::Error;

/// Input rejected before any slicing work starts
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SliceError {
    #[error("cut plane normal must be finite and non-zero, got [{0}, {1}, {2}]")]
    InvalidPlane(f64, f64, f64),

    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfBounds {
        triangle: usize,
        index: usize,
        vertex_count: usize,
    },

    #[error("{attribute} buffer has {found} entries, expected {expected}")]
    AttributeMismatch {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("index buffer length {0} is not a multiple of three")]
    IndexCountNotMultipleOfThree(usize),

    #[error("vertex {0} has a non-finite position")]
    NonFiniteVertex(usize),
}

pub type Result<T> = std::result::Result<T, SliceError>;
