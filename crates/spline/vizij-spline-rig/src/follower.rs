//! Path follower: advances along a spline at a fixed speed and never runs
//! past the most recently published time limit.
//!
//! The follower learns about new limits through the store's `Retimed`
//! notification, so a path that keeps growing (waypoints registered as the
//! rig passes checkpoints) extends the follower's range without polling.

use std::sync::mpsc::{channel, Receiver};

use log::debug;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use vizij_spline_core::{ListenerId, SplineError, SplineEvent, WaypointStore};

use crate::{Result, RigError};

/// Which orientation the follower reports.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// SQUAD-interpolated waypoint orientations.
    #[default]
    Spline,
    /// Look toward the position a configured delta ahead.
    Lookahead,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Spline time units per second.
    pub speed: f32,
    pub facing: FacingMode,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            speed: 0.1,
            facing: FacingMode::Spline,
        }
    }
}

impl FollowerConfig {
    /// Parse a follower document; missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.speed.is_finite() {
            return Err(RigError::Spline(SplineError::Config {
                reason: format!("speed must be finite, got {}", self.speed),
            }));
        }
        Ok(())
    }
}

/// Pose produced by one `advance` step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigPose {
    pub time: f32,
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    /// Progress is pinned at the current time limit.
    pub at_limit: bool,
}

#[derive(Debug)]
pub struct PathFollower {
    config: FollowerConfig,
    progress: f32,
    limit: f32,
    limits: Receiver<f32>,
    listener: ListenerId,
    last_orientation: UnitQuaternion<f32>,
}

impl PathFollower {
    /// Subscribe to `store` and start at time 0.
    pub fn attach(store: &mut WaypointStore, config: FollowerConfig) -> Self {
        let (tx, rx) = channel();
        let listener = store.subscribe(move |event| {
            if let SplineEvent::Retimed { time_limit } = event {
                // Receiver gone means the follower was dropped without detaching.
                let _ = tx.send(*time_limit);
            }
        });
        let limit = if store.is_ready() {
            store.time_limit()
        } else {
            0.0
        };
        Self {
            config,
            progress: 0.0,
            limit,
            limits: rx,
            listener,
            last_orientation: UnitQuaternion::identity(),
        }
    }

    /// Remove the follower's subscription from `store`.
    pub fn detach(self, store: &mut WaypointStore) -> bool {
        store.unsubscribe(self.listener)
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Latest time limit received from the store.
    #[inline]
    pub fn limit(&self) -> f32 {
        self.limit
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.config.speed = speed;
    }

    fn drain_limits(&mut self) {
        for limit in self.limits.try_iter() {
            if limit != self.limit {
                debug!("PathFollower: time limit {} -> {}", self.limit, limit);
            }
            self.limit = limit;
        }
    }

    /// Advance by `dt` seconds and sample the store.
    ///
    /// Returns `Ok(None)` while the store is not ready; progress is held.
    pub fn advance(&mut self, store: &WaypointStore, dt: f32) -> Result<Option<RigPose>> {
        self.drain_limits();
        if !store.is_ready() {
            return Ok(None);
        }

        self.progress = (self.progress + dt * self.config.speed).clamp(0.0, self.limit);
        let t = self.progress;
        let eval = store.evaluator();
        let position = eval.evaluate_position(t)?;
        let orientation = match self.config.facing {
            FacingMode::Spline => eval.evaluate_orientation(t)?,
            FacingMode::Lookahead => match eval.evaluate_facing(t) {
                Ok(q) => q,
                // End of the path, or heading straight along up.
                Err(SplineError::DegenerateInterpolation { .. }) => self.last_orientation,
                Err(err) => return Err(err.into()),
            },
        };
        self.last_orientation = orientation;

        Ok(Some(RigPose {
            time: t,
            position,
            orientation,
            at_limit: t >= self.limit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vizij_spline_core::OriginId;

    #[test]
    fn config_json_uses_lowercase_facing() {
        let cfg = FollowerConfig::from_json_str(r#"{ "facing": "lookahead" }"#).unwrap();
        assert_eq!(cfg.facing, FacingMode::Lookahead);
        assert_eq!(cfg.speed, 0.1);
    }

    #[test]
    fn non_finite_speed_is_rejected() {
        // 1e39 is a valid JSON number that overflows f32 to infinity.
        let err = FollowerConfig::from_json_str(r#"{ "speed": 1e39 }"#).unwrap_err();
        assert!(matches!(err, RigError::Spline(SplineError::Config { .. })));

        let cfg = FollowerConfig {
            speed: f32::NAN,
            ..FollowerConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(RigError::Spline(SplineError::Config { .. }))
        ));
        assert!(FollowerConfig::default().validate().is_ok());
    }

    #[test]
    fn holds_until_store_is_ready() {
        let mut store = WaypointStore::new();
        let mut follower = PathFollower::attach(&mut store, FollowerConfig::default());
        store
            .register(OriginId(0), Vector3::zeros(), UnitQuaternion::identity())
            .unwrap();
        assert_eq!(follower.advance(&store, 1.0).unwrap(), None);
        assert_eq!(follower.progress(), 0.0);
    }

    #[test]
    fn detach_removes_listener() {
        let mut store = WaypointStore::new();
        let follower = PathFollower::attach(&mut store, FollowerConfig::default());
        assert_eq!(store.listener_count(), 1);
        assert!(follower.detach(&mut store));
        assert_eq!(store.listener_count(), 0);
    }
}
