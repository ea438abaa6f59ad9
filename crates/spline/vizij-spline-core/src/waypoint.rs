//! Waypoint: a timed sample of position and orientation.

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::SplineError;
use crate::ids::OriginId;

/// A single control sample of the spline.
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    /// Identity of the object that produced this sample (lookup key only).
    pub origin: OriginId,
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    /// Parameter value assigned by re-timing. Zero until the first pass.
    pub time: f32,
}

impl Waypoint {
    #[inline]
    pub fn new(origin: OriginId, position: Vector3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        Self {
            origin,
            position,
            orientation,
            time: 0.0,
        }
    }

    /// Reject non-finite samples and quaternions that are not unit length.
    pub(crate) fn validate(
        position: &Vector3<f32>,
        orientation: &UnitQuaternion<f32>,
    ) -> Result<(), SplineError> {
        if !position.iter().all(|c| c.is_finite()) {
            return Err(SplineError::InvalidWaypoint {
                reason: format!("non-finite position {:?}", position.as_slice()),
            });
        }
        let coords = &orientation.coords;
        if !coords.iter().all(|c| c.is_finite()) {
            return Err(SplineError::InvalidWaypoint {
                reason: "non-finite orientation".to_string(),
            });
        }
        if (coords.norm() - 1.0).abs() > 1e-3 {
            return Err(SplineError::InvalidWaypoint {
                reason: format!("orientation is not unit length (norm {})", coords.norm()),
            });
        }
        Ok(())
    }
}
