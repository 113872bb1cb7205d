// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation, planes and measurements

mod analytics;
mod bbox;
mod mesh;
mod plane;
mod primitives;

pub use analytics::{analyze, is_watertight, signed_volume, surface_area, volume, GeometryStats};
pub use bbox::BoundingBox;
pub use mesh::{Mesh, Triangle, Vertex};
pub use plane::{Plane, Side};
pub use primitives::Primitive;
