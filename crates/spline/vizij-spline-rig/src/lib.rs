//! Vizij Spline Rig
//!
//! Consumers of `vizij-spline-core`: a `PathFollower` that moves along a
//! growing spline, and `PathSeed` documents for registering waypoint lists
//! from JSON.

pub mod follower;
pub mod seed;

use thiserror::Error;
use vizij_spline_core::SplineError;

pub use follower::{FacingMode, FollowerConfig, PathFollower, RigPose};
pub use seed::{PathSeed, WaypointSeed};

#[derive(Debug, Error)]
pub enum RigError {
    #[error(transparent)]
    Spline(#[from] SplineError),
    #[error("invalid path seed '{name}': {reason}")]
    InvalidSeed { name: String, reason: String },
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, RigError>;
