//! Error types for the spline engine

use serde::{Deserialize, Serialize};

use crate::store::SplineState;

/// Errors raised while registering waypoints, re-timing or evaluating the spline.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SplineError {
    /// Not enough waypoints to build a piecewise cubic parameterization
    #[error("Insufficient waypoints: {count} registered, at least {required} required")]
    InsufficientWaypoints { count: usize, required: usize },

    /// Query time outside the evaluable range, or no enclosing segment
    #[error("Time {time} is out of range [{start}, {end}]")]
    QueryOutOfRange { time: f32, start: f32, end: f32 },

    /// Quaternion log/exp/slerp or look-at construction failed numerically
    #[error("Degenerate interpolation: {reason}")]
    DegenerateInterpolation { reason: String },

    /// Evaluation attempted while the store has no valid timing
    #[error("Spline is not ready (state: {state:?})")]
    NotReady { state: SplineState },

    /// Re-timing produced a zero-length or non-monotonic segment
    #[error("Degenerate segment starting at waypoint {index}")]
    DegenerateSegment { index: usize },

    /// Registration input rejected before touching the store
    #[error("Invalid waypoint: {reason}")]
    InvalidWaypoint { reason: String },

    /// Configuration could not be parsed
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl SplineError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInterpolation {
            reason: reason.into(),
        }
    }

    /// Check if the caller can recover by waiting, re-querying or adding waypoints
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientWaypoints { .. }
                | Self::QueryOutOfRange { .. }
                | Self::DegenerateInterpolation { .. }
                | Self::NotReady { .. }
                | Self::DegenerateSegment { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InsufficientWaypoints { .. } | Self::NotReady { .. } => "readiness",
            Self::QueryOutOfRange { .. } => "query",
            Self::DegenerateInterpolation { .. } => "interpolation",
            Self::DegenerateSegment { .. } => "timing",
            Self::InvalidWaypoint { .. } => "validation",
            Self::Config { .. } => "config",
        }
    }
}

impl From<serde_json::Error> for SplineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverability() {
        let recoverable = SplineError::QueryOutOfRange {
            time: 2.0,
            start: 0.0,
            end: 1.0,
        };
        assert!(recoverable.is_recoverable());

        let non_recoverable = SplineError::InvalidWaypoint {
            reason: "NaN position".to_string(),
        };
        assert!(!non_recoverable.is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        let err = SplineError::InsufficientWaypoints {
            count: 2,
            required: 4,
        };
        assert_eq!(err.category(), "readiness");
        assert_eq!(SplineError::degenerate("x").category(), "interpolation");
        assert_eq!(
            SplineError::DegenerateSegment { index: 3 }.category(),
            "timing"
        );
    }

    #[test]
    fn test_out_of_range_message() {
        let err = SplineError::QueryOutOfRange {
            time: 1.5,
            start: 0.0,
            end: 1.0,
        };
        assert_eq!(err.to_string(), "Time 1.5 is out of range [0, 1]");
    }

    #[test]
    fn test_serialization() {
        let error = SplineError::NotReady {
            state: SplineState::Accumulating,
        };
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: SplineError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }
}
