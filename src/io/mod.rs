// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - reading and writing meshes

mod stl;

pub use stl::{export_stl, import_stl};
