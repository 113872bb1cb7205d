// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Slicing configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`SliceConfig::load`]
pub const CONFIG_FILE: &str = "meshcut.toml";

/// How cross-section rings are turned into cap triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapMode {
    /// Fan from the first ring vertex, correct for convex rings only
    Fan,
    /// Ear clipping for every ring
    EarClip,
    /// Fan for convex rings, ear clipping for the rest
    Auto,
}

impl std::str::FromStr for CapMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fan" => Ok(CapMode::Fan),
            "ear_clip" | "earclip" | "ear-clip" => Ok(CapMode::EarClip),
            "auto" => Ok(CapMode::Auto),
            other => anyhow::bail!("Unknown cap mode: {}", other),
        }
    }
}

/// Slicing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    /// Half-width of the on-plane band
    pub epsilon: f64,
    /// Multiply `epsilon` and `weld_tolerance` by the mesh diagonal (when above one)
    pub scale_epsilon_with_bounds: bool,
    /// Distance under which two ring endpoints are the same point
    pub weld_tolerance: f64,
    /// Cap triangulation strategy
    pub cap_mode: CapMode,
    /// Drop collinear ring points before triangulating the cap
    pub simplify_cap: bool,
    /// Expected vertex count, used to size scratch and output buffers
    pub capacity_hint: usize,
    /// Whole slice jobs processed per scheduler tick
    pub max_slices_per_tick: usize,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            scale_epsilon_with_bounds: true,
            weld_tolerance: 1e-6,
            cap_mode: CapMode::Auto,
            simplify_cap: true,
            capacity_hint: 256,
            max_slices_per_tick: 2,
        }
    }
}

impl SliceConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: SliceConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `meshcut.toml` from the working directory if present, then apply
    /// environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `MESHCUT_*` environment variables on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(epsilon) = std::env::var("MESHCUT_EPSILON") {
            self.epsilon = epsilon
                .parse()
                .with_context(|| format!("Invalid MESHCUT_EPSILON: {}", epsilon))?;
        }

        if let Ok(tolerance) = std::env::var("MESHCUT_WELD_TOLERANCE") {
            self.weld_tolerance = tolerance
                .parse()
                .with_context(|| format!("Invalid MESHCUT_WELD_TOLERANCE: {}", tolerance))?;
        }

        if let Ok(mode) = std::env::var("MESHCUT_CAP_MODE") {
            self.cap_mode = mode.parse()?;
        }

        if let Ok(quota) = std::env::var("MESHCUT_SLICES_PER_TICK") {
            self.max_slices_per_tick = quota
                .parse()
                .with_context(|| format!("Invalid MESHCUT_SLICES_PER_TICK: {}", quota))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// On-plane band for a mesh with the given bounding-box diagonal
    pub fn effective_epsilon(&self, diagonal: f64) -> f64 {
        self.scaled(self.epsilon, diagonal)
    }

    /// Ring weld distance for a mesh with the given bounding-box diagonal
    pub fn effective_weld_tolerance(&self, diagonal: f64) -> f64 {
        self.scaled(self.weld_tolerance, diagonal)
    }

    fn scaled(&self, value: f64, diagonal: f64) -> f64 {
        if self.scale_epsilon_with_bounds && diagonal.is_finite() {
            value * diagonal.max(1.0)
        } else {
            value
        }
    }
}
