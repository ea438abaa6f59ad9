//! Waypoint store: the canonical, time-ordered list of spline control samples.
//!
//! Timing model:
//! - Waypoints are append-ordered. Registering a known origin moves that
//!   waypoint in place instead of appending.
//! - Every append re-times the whole sequence uniformly:
//!   `step = 1 / (count - 3)`, interior waypoint `i` gets `(i - 1) * step`,
//!   the first and last waypoints are phantoms at `-step` and `1 + step`.
//! - `time_limit = (count - 1) * step - 2 * step` is the largest valid query.
//!
//! Evaluation lives in `SplineEvaluator`, obtained through `evaluator()`.

use log::{debug, warn};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::SplineConfig;
use crate::error::SplineError;
use crate::evaluator::SplineEvaluator;
use crate::events::{ListenerSet, SplineEvent};
use crate::ids::{ListenerId, OriginId};
use crate::waypoint::Waypoint;

/// Two context samples around the first and last real segment.
pub const MIN_WAYPOINTS: usize = 4;

/// Lifecycle of the store's timing.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SplineState {
    #[default]
    Empty,
    /// Fewer than `MIN_WAYPOINTS`, or a mutation is in flight.
    Accumulating,
    /// Times are strictly increasing and queries are accepted.
    Ready,
    /// Re-timing produced a zero-length or non-monotonic segment.
    Invalid,
}

/// Whether a registration that only updates an existing origin re-times.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum RetimePolicy {
    /// Re-time on append only; in-place updates keep the current times.
    #[default]
    OnAppend,
    /// Re-time after every registration.
    Always,
}

/// What a registration did to the sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Registration {
    Appended { index: usize },
    Updated { index: usize },
}

impl Registration {
    #[inline]
    pub fn index(&self) -> usize {
        match *self {
            Self::Appended { index } | Self::Updated { index } => index,
        }
    }
}

#[derive(Debug, Default)]
pub struct WaypointStore {
    config: SplineConfig,
    waypoints: Vec<Waypoint>,
    uniform_step: f32,
    time_limit: f32,
    state: SplineState,
    /// Set once a re-timing pass has succeeded; sequential appends need it.
    timed: bool,
    listeners: ListenerSet,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SplineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[inline]
    pub fn config(&self) -> &SplineConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> SplineState {
        self.state
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == SplineState::Ready
    }

    /// Largest externally valid query time. Zero until the first re-timing.
    #[inline]
    pub fn time_limit(&self) -> f32 {
        self.time_limit
    }

    /// Spacing between interior waypoints from the latest re-timing.
    #[inline]
    pub fn uniform_step(&self) -> f32 {
        self.uniform_step
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    #[inline]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn get(&self, origin: OriginId) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.origin == origin)
    }

    /// Time most recently assigned to the waypoint produced by `origin`.
    pub fn time_of(&self, origin: OriginId) -> Option<f32> {
        self.get(origin).map(|w| w.time)
    }

    /// Borrowed query view; evaluation can never overlap a registration.
    #[inline]
    pub fn evaluator(&self) -> SplineEvaluator<'_> {
        SplineEvaluator::new(self)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&SplineEvent) + Send + 'static,
    {
        self.listeners.insert(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Register a waypoint, re-timing on append.
    pub fn register(
        &mut self,
        origin: OriginId,
        position: Vector3<f32>,
        orientation: UnitQuaternion<f32>,
    ) -> Result<Registration, SplineError> {
        self.register_with(origin, position, orientation, RetimePolicy::OnAppend)
    }

    pub fn register_with(
        &mut self,
        origin: OriginId,
        position: Vector3<f32>,
        orientation: UnitQuaternion<f32>,
        policy: RetimePolicy,
    ) -> Result<Registration, SplineError> {
        Waypoint::validate(&position, &orientation)?;
        let previous = self.state;
        self.state = SplineState::Accumulating;

        if let Some(index) = self.waypoints.iter().position(|w| w.origin == origin) {
            self.waypoints[index].position = position;
            debug!("Spline: waypoint at index {index} updated");
            let registration = Registration::Updated { index };
            if policy == RetimePolicy::Always {
                return self.retime_after_register(registration);
            }
            return match previous {
                SplineState::Ready | SplineState::Invalid => {
                    self.revalidate()?;
                    Ok(registration)
                }
                other => {
                    self.state = other;
                    Ok(registration)
                }
            };
        }

        self.waypoints.push(Waypoint::new(origin, position, orientation));
        let registration = Registration::Appended {
            index: self.waypoints.len() - 1,
        };
        self.retime_after_register(registration)
    }

    fn retime_after_register(
        &mut self,
        registration: Registration,
    ) -> Result<Registration, SplineError> {
        match self.retime() {
            Ok(_) | Err(SplineError::InsufficientWaypoints { .. }) => Ok(registration),
            Err(err) => Err(err),
        }
    }

    /// Append without de-duplication or a full re-timing pass: the new
    /// waypoint is placed one uniform step after the current last one.
    pub fn register_sequential(
        &mut self,
        origin: OriginId,
        position: Vector3<f32>,
        orientation: UnitQuaternion<f32>,
    ) -> Result<Registration, SplineError> {
        Waypoint::validate(&position, &orientation)?;
        if !self.timed || self.waypoints.is_empty() {
            return Err(SplineError::NotReady { state: self.state });
        }
        self.state = SplineState::Accumulating;

        let last_time = self.waypoints[self.waypoints.len() - 1].time;
        let mut waypoint = Waypoint::new(origin, position, orientation);
        waypoint.time = last_time + self.uniform_step;
        self.waypoints.push(waypoint);
        let index = self.waypoints.len() - 1;

        self.emit(&SplineEvent::WaypointTimed {
            origin,
            time: self.waypoints[index].time,
        });
        self.finish_timing()?;
        Ok(Registration::Appended { index })
    }

    /// Recompute every waypoint time from scratch and return the new limit.
    pub fn retime(&mut self) -> Result<f32, SplineError> {
        let count = self.waypoints.len();
        if count < MIN_WAYPOINTS {
            self.state = if count == 0 {
                SplineState::Empty
            } else {
                SplineState::Accumulating
            };
            debug!("Spline: too short ({count} waypoints), unable to recalculate times");
            return Err(SplineError::InsufficientWaypoints {
                count,
                required: MIN_WAYPOINTS,
            });
        }

        let step = 1.0 / (count - 3) as f32;
        self.uniform_step = step;
        for i in 0..(count - 2) {
            self.waypoints[i + 1].time = i as f32 * step;
        }
        self.waypoints[0].time = -step;
        self.waypoints[count - 1].time = 1.0 + step;
        self.timed = true;

        for i in 0..count {
            let event = SplineEvent::WaypointTimed {
                origin: self.waypoints[i].origin,
                time: self.waypoints[i].time,
            };
            self.emit(&event);
        }
        debug!("Spline: times recalculated");
        self.finish_timing()
    }

    /// Publish the limit, validate, and notify.
    ///
    /// The limit is `(count - 1) * step - 2 * step`, read back from the last
    /// real waypoint so it matches that knot's time bit for bit.
    fn finish_timing(&mut self) -> Result<f32, SplineError> {
        let count = self.waypoints.len();
        self.time_limit = self.waypoints[count - 2].time;
        self.revalidate()?;

        if self.config.log_timing {
            debug!("Spline: {}", self.timing_report());
        }
        let time_limit = self.time_limit;
        self.emit(&SplineEvent::Retimed { time_limit });
        Ok(time_limit)
    }

    /// Check the current times and positions without assigning new times.
    fn revalidate(&mut self) -> Result<(), SplineError> {
        if let Some(index) = self.find_degenerate_segment() {
            self.state = SplineState::Invalid;
            warn!("Spline: degenerate segment at waypoint {index}; timing invalidated");
            self.emit(&SplineEvent::TimingInvalidated { index });
            return Err(SplineError::DegenerateSegment { index });
        }
        self.state = SplineState::Ready;
        Ok(())
    }

    fn find_degenerate_segment(&self) -> Option<usize> {
        if !self.time_limit.is_finite() {
            return Some(0);
        }
        let eps = self.config.knot_epsilon;
        self.waypoints.windows(2).enumerate().find_map(|(i, pair)| {
            let (a, b) = (&pair[0], &pair[1]);
            let monotonic = a.time.is_finite() && b.time.is_finite() && b.time > a.time;
            let collapsed = (b.position - a.position).norm() <= eps;
            (!monotonic || collapsed).then_some(i)
        })
    }

    fn emit(&mut self, event: &SplineEvent) {
        self.listeners.emit(event);
    }

    /// One entry per waypoint followed by the limit, e.g.
    /// `Waypoint #0: -1.00| Waypoint #1: 0.00| ... Limit: 1`.
    pub fn timing_report(&self) -> String {
        self.waypoints
            .iter()
            .enumerate()
            .map(|(i, w)| format!("Waypoint #{i}: {:.2}", w.time))
            .chain(std::iter::once(format!("Limit: {}", self.time_limit)))
            .collect::<Vec<_>>()
            .join("| ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(store: &mut WaypointStore, id: u32, x: f32) -> Result<Registration, SplineError> {
        store.register(OriginId(id), Vector3::new(x, 0.0, 0.0), UnitQuaternion::identity())
    }

    #[test]
    fn starts_empty_and_not_ready() {
        let store = WaypointStore::new();
        assert_eq!(store.state(), SplineState::Empty);
        assert!(!store.is_ready());
        assert_eq!(store.time_limit(), 0.0);
    }

    #[test]
    fn accumulates_until_four() {
        let mut store = WaypointStore::new();
        for i in 0..3 {
            push(&mut store, i, i as f32).unwrap();
            assert_eq!(store.state(), SplineState::Accumulating);
        }
        push(&mut store, 3, 3.0).unwrap();
        assert_eq!(store.state(), SplineState::Ready);
    }

    #[test]
    fn retime_on_short_store_reports_insufficient() {
        let mut store = WaypointStore::new();
        push(&mut store, 0, 0.0).unwrap();
        assert_eq!(
            store.retime(),
            Err(SplineError::InsufficientWaypoints {
                count: 1,
                required: MIN_WAYPOINTS
            })
        );
    }

    #[test]
    fn timing_report_lists_every_waypoint() {
        let mut store = WaypointStore::new();
        for i in 0..4 {
            push(&mut store, i, i as f32).unwrap();
        }
        assert_eq!(
            store.timing_report(),
            "Waypoint #0: -1.00| Waypoint #1: 0.00| Waypoint #2: 1.00| Waypoint #3: 2.00| Limit: 1"
        );
    }

    #[test]
    fn sequential_requires_prior_timing() {
        let mut store = WaypointStore::new();
        push(&mut store, 0, 0.0).unwrap();
        let err = store
            .register_sequential(OriginId(9), Vector3::new(5.0, 0.0, 0.0), UnitQuaternion::identity())
            .unwrap_err();
        assert!(matches!(err, SplineError::NotReady { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_input_leaves_store_untouched() {
        let mut store = WaypointStore::new();
        let err = store
            .register(OriginId(0), Vector3::new(f32::INFINITY, 0.0, 0.0), UnitQuaternion::identity())
            .unwrap_err();
        assert!(matches!(err, SplineError::InvalidWaypoint { .. }));
        assert!(store.is_empty());
        assert_eq!(store.state(), SplineState::Empty);
    }
}
