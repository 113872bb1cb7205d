// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut planes and half-space classification

use crate::error::{Result, SliceError};
use nalgebra::{Matrix4, Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// Which half-space a point falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Positive,
    Negative,
    OnPlane,
}

impl Side {
    /// Classify a signed distance against a symmetric epsilon band
    pub fn from_distance(distance: f64, epsilon: f64) -> Self {
        if distance > epsilon {
            Side::Positive
        } else if distance < -epsilon {
            Side::Negative
        } else {
            Side::OnPlane
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Positive => Side::Negative,
            Side::Negative => Side::Positive,
            Side::OnPlane => Side::OnPlane,
        }
    }
}

/// Infinite plane `{ p : normal · p = distance }` with a unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    normal: Unit<Vector3<f64>>,
    distance: f64,
}

impl Plane {
    /// Build a plane from any non-zero normal. The distance is rescaled so the
    /// plane stays where `normal · p = distance` put it.
    pub fn new(normal: Vector3<f64>, distance: f64) -> Result<Self> {
        let length = normal.norm();
        if !length.is_finite() || length <= f64::EPSILON || !distance.is_finite() {
            return Err(SliceError::InvalidPlane(normal.x, normal.y, normal.z));
        }
        Ok(Self {
            normal: Unit::new_unchecked(normal / length),
            distance: distance / length,
        })
    }

    /// Plane through `point` facing along `normal`
    pub fn from_point_normal(point: &Point3<f64>, normal: &Vector3<f64>) -> Result<Self> {
        let length = normal.norm();
        if !length.is_finite() || length <= f64::EPSILON {
            return Err(SliceError::InvalidPlane(normal.x, normal.y, normal.z));
        }
        let unit = normal / length;
        Self::new(unit, unit.dot(&point.coords))
    }

    /// Plane swept by a stroke drawn from `start` to `end` while looking along
    /// `view_direction`. A zero-length stroke falls back to the +X tangent.
    pub fn from_stroke(
        start: &Point3<f64>,
        end: &Point3<f64>,
        view_direction: &Vector3<f64>,
    ) -> Result<Self> {
        let tangent = (end - start)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::x);
        Self::from_point_normal(start, &view_direction.cross(&tangent))
    }

    pub fn normal(&self) -> &Vector3<f64> {
        self.normal.as_ref()
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Point of the plane closest to the origin
    pub fn origin(&self) -> Point3<f64> {
        Point3::from(self.normal.into_inner() * self.distance)
    }

    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }

    /// Same plane with the half-spaces swapped
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Express a world-space plane in the local frame of an object whose
    /// local-to-world matrix is given. Points map through the inverse, the
    /// normal through the transpose.
    pub fn to_local(&self, local_to_world: &Matrix4<f64>) -> Result<Self> {
        let world_to_local = local_to_world.try_inverse().ok_or_else(|| {
            let n = self.normal();
            SliceError::InvalidPlane(n.x, n.y, n.z)
        })?;
        let point = world_to_local.transform_point(&self.origin());
        let normal = local_to_world.transpose().transform_vector(self.normal());
        Self::from_point_normal(&point, &normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes() {
        let plane = Plane::new(Vector3::new(0.0, 2.0, 0.0), 4.0).unwrap();
        assert_eq!(*plane.normal(), Vector3::y());
        assert_eq!(plane.distance(), 2.0);
        assert_eq!(plane.signed_distance(&Point3::new(5.0, 3.0, -1.0)), 1.0);
    }

    #[test]
    fn test_rejects_zero_normal() {
        assert!(Plane::new(Vector3::zeros(), 1.0).is_err());
        assert!(Plane::new(Vector3::new(f64::NAN, 0.0, 0.0), 0.0).is_err());
        assert!(Plane::from_point_normal(&Point3::origin(), &Vector3::zeros()).is_err());
    }

    #[test]
    fn test_flipped_swaps_sides() {
        let plane = Plane::new(Vector3::x(), 0.5).unwrap();
        let point = Point3::new(1.0, 0.0, 0.0);
        assert!((plane.signed_distance(&point) - 0.5).abs() < 1e-12);
        assert!((plane.flipped().signed_distance(&point) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_stroke() {
        // Horizontal stroke seen from the front produces a horizontal cut
        let plane = Plane::from_stroke(
            &Point3::new(-1.0, 0.5, 0.0),
            &Point3::new(1.0, 0.5, 0.0),
            &Vector3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert!((plane.normal() - Vector3::y()).norm() < 1e-12);
        assert!((plane.distance() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_to_local_translation_and_scale() {
        let world = Plane::new(Vector3::x(), 3.0).unwrap();
        let local_to_world = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0))
            * Matrix4::new_scaling(2.0);

        let local = world.to_local(&local_to_world).unwrap();

        // World x = 3 is local x = (3 - 1) / 2 = 1
        assert!((local.normal() - Vector3::x()).norm() < 1e-12);
        assert!((local.distance() - 1.0).abs() < 1e-12);
    }
}
