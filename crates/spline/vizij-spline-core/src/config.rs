//! Core configuration for vizij-spline-core.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::SplineError;

/// Tunables for re-timing and evaluation.
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineConfig {
    /// Time offset used by the facing (look-ahead) orientation query.
    pub lookahead_delta: f32,

    /// Consecutive waypoints closer than this collapse a segment and
    /// send the store to `SplineState::Invalid`.
    pub knot_epsilon: f32,

    /// World up vector used when constructing look-at orientations.
    pub up: [f32; 3],

    /// Emit the per-waypoint timing report at debug level after re-timing.
    pub log_timing: bool,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            lookahead_delta: 0.05,
            knot_epsilon: 1e-6,
            up: [0.0, 1.0, 0.0],
            log_timing: true,
        }
    }
}

impl SplineConfig {
    /// Parse a configuration document; missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, SplineError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SplineError> {
        if !self.lookahead_delta.is_finite() || self.lookahead_delta < 0.0 {
            return Err(SplineError::Config {
                reason: format!("lookahead_delta must be >= 0, got {}", self.lookahead_delta),
            });
        }
        if !self.knot_epsilon.is_finite() || self.knot_epsilon < 0.0 {
            return Err(SplineError::Config {
                reason: format!("knot_epsilon must be >= 0, got {}", self.knot_epsilon),
            });
        }
        let up = self.up_vector();
        if !up.iter().all(|c| c.is_finite()) || up.norm_squared() == 0.0 {
            return Err(SplineError::Config {
                reason: format!("up must be a finite non-zero vector, got {:?}", self.up),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn up_vector(&self) -> Vector3<f32> {
        Vector3::new(self.up[0], self.up[1], self.up[2])
    }
}
