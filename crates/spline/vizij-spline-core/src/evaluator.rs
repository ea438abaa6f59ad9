//! Spline evaluation over a ready `WaypointStore`.
//!
//! Segment `i` spans `waypoints[i] .. waypoints[i + 1]` and is evaluated with
//! the context samples `i - 1` and `i + 2`. Phantom endpoints guarantee both
//! exist for every query in `[0, time_limit]`.

use std::fmt;

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::SplineError;
use crate::interp::functions::{
    align_hemisphere, catmull_rom_terms, squad, squad_intermediate, CatmullRomTerms,
};
use crate::store::{SplineState, WaypointStore, MIN_WAYPOINTS};

/// Minimum look-at direction length and up/direction separation.
const LOOK_EPS: f32 = 1e-6;

/// Position and orientation at one query time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplineSample {
    pub time: f32,
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

/// Every intermediate of a position query, for on-screen debugging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionBreakdown {
    pub waypoint_count: usize,
    pub segment: usize,
    /// Query time re-normalized into the segment.
    pub local_t: f32,
    pub control_points: [Vector3<f32>; 4],
    pub terms: CatmullRomTerms,
    pub position: Vector3<f32>,
}

impl fmt::Display for PositionBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = |p: &Vector3<f32>| format!("({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
        writeln!(f, "Waypoints count: {}", self.waypoint_count)?;
        writeln!(f, "Segment index: {}", self.segment)?;
        writeln!(f, "Local t: {:.4}", self.local_t)?;
        for (i, p) in self.control_points.iter().enumerate() {
            writeln!(f, "Pos_{i}: {}", v(p))?;
        }
        writeln!(f, "Tension_1: {}", v(&self.terms.constant))?;
        writeln!(f, "Tension_2: {}", v(&self.terms.linear))?;
        writeln!(f, "Tension_3: {}", v(&self.terms.quadratic))?;
        writeln!(f, "Tension_4: {}", v(&self.terms.cubic))?;
        write!(f, "Result: {}", v(&self.position))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SplineEvaluator<'a> {
    store: &'a WaypointStore,
}

impl<'a> SplineEvaluator<'a> {
    #[inline]
    pub fn new(store: &'a WaypointStore) -> Self {
        Self { store }
    }

    fn ensure_ready(&self) -> Result<(), SplineError> {
        let count = self.store.len();
        if count < MIN_WAYPOINTS {
            return Err(SplineError::InsufficientWaypoints {
                count,
                required: MIN_WAYPOINTS,
            });
        }
        match self.store.state() {
            SplineState::Ready => Ok(()),
            state => Err(SplineError::NotReady { state }),
        }
    }

    fn out_of_range(&self, t: f32) -> SplineError {
        SplineError::QueryOutOfRange {
            time: t,
            start: 0.0,
            end: self.store.time_limit(),
        }
    }

    /// Index `i` of the segment `[waypoints[i], waypoints[i + 1]]` containing `t`.
    ///
    /// Any in-range query with no real waypoint strictly after it (the last
    /// real knot itself) resolves to the last real segment.
    pub fn find_segment(&self, t: f32) -> Result<usize, SplineError> {
        self.ensure_ready()?;
        if !(0.0..=self.store.time_limit()).contains(&t) {
            return Err(self.out_of_range(t));
        }

        let waypoints = self.store.waypoints();
        let count = waypoints.len();
        Ok((0..count - 2)
            .find(|&i| waypoints[i + 1].time > t)
            .unwrap_or(count - 3))
    }

    /// Segment index plus `t` re-normalized into that segment.
    pub fn locate(&self, t: f32) -> Result<(usize, f32), SplineError> {
        let i = self.find_segment(t)?;
        let waypoints = self.store.waypoints();
        let (t0, t1) = (waypoints[i].time, waypoints[i + 1].time);
        Ok((i, (t - t0) / (t1 - t0)))
    }

    pub fn position_breakdown(&self, t: f32) -> Result<PositionBreakdown, SplineError> {
        let (i, u) = self.locate(t)?;
        let waypoints = self.store.waypoints();
        let control_points = [
            waypoints[i - 1].position,
            waypoints[i].position,
            waypoints[i + 1].position,
            waypoints[i + 2].position,
        ];
        let [p0, p1, p2, p3] = control_points;
        let terms = catmull_rom_terms(p0, p1, p2, p3, u);
        // At u = 1 the blend is exactly p2.
        let position = if u >= 1.0 { p2 } else { terms.sum() };
        Ok(PositionBreakdown {
            waypoint_count: waypoints.len(),
            segment: i,
            local_t: u,
            control_points,
            terms,
            position,
        })
    }

    pub fn evaluate_position(&self, t: f32) -> Result<Vector3<f32>, SplineError> {
        self.position_breakdown(t).map(|b| b.position)
    }

    pub fn evaluate_orientation(&self, t: f32) -> Result<UnitQuaternion<f32>, SplineError> {
        let (i, u) = self.locate(t)?;
        let waypoints = self.store.waypoints();

        let q1 = waypoints[i].orientation;
        let q0 = align_hemisphere(&q1, &waypoints[i - 1].orientation);
        let q2 = align_hemisphere(&q1, &waypoints[i + 1].orientation);
        let q3 = align_hemisphere(&q2, &waypoints[i + 2].orientation);

        let a = squad_intermediate(&q0, &q1, &q2)?;
        let b = squad_intermediate(&q1, &q2, &q3)?;
        squad(u, &q1, &q2, &a, &b)
    }

    /// Orientation looking from the position at `t` toward the position at
    /// `min(t + delta, time_limit)`, with +Z forward and the configured up.
    pub fn evaluate_lookahead_orientation(
        &self,
        t: f32,
        delta: f32,
    ) -> Result<UnitQuaternion<f32>, SplineError> {
        let here = self.evaluate_position(t)?;
        let ahead_t = (t + delta).min(self.store.time_limit());
        let ahead = self.evaluate_position(ahead_t)?;

        let dir = ahead - here;
        if dir.norm() < LOOK_EPS {
            return Err(SplineError::degenerate(format!(
                "look-ahead direction at t = {t} has zero length"
            )));
        }
        let up = self.store.config().up_vector();
        if dir.normalize().cross(&up.normalize()).norm() < LOOK_EPS {
            return Err(SplineError::degenerate(format!(
                "look-ahead direction at t = {t} is parallel to up"
            )));
        }
        Ok(UnitQuaternion::face_towards(&dir, &up))
    }

    /// Look-ahead orientation using the configured delta.
    pub fn evaluate_facing(&self, t: f32) -> Result<UnitQuaternion<f32>, SplineError> {
        self.evaluate_lookahead_orientation(t, self.store.config().lookahead_delta)
    }

    pub fn sample(&self, t: f32) -> Result<SplineSample, SplineError> {
        Ok(SplineSample {
            time: t,
            position: self.evaluate_position(t)?,
            orientation: self.evaluate_orientation(t)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::OriginId;
    use approx::assert_relative_eq;

    fn line(n: u32) -> WaypointStore {
        let mut store = WaypointStore::new();
        for i in 0..n {
            store
                .register(OriginId(i), Vector3::new(i as f32, 0.0, 0.0), UnitQuaternion::identity())
                .unwrap();
        }
        store
    }

    #[test]
    fn find_segment_scans_to_first_later_waypoint() {
        let store = line(6);
        // times: -0.333, 0, 0.333, 0.667, 1, 1.333
        let eval = store.evaluator();
        assert_eq!(eval.find_segment(0.0).unwrap(), 1);
        assert_eq!(eval.find_segment(0.5).unwrap(), 2);
        assert_eq!(eval.find_segment(0.9).unwrap(), 3);
    }

    #[test]
    fn limit_falls_back_to_last_real_segment() {
        let store = line(4);
        let eval = store.evaluator();
        assert_eq!(eval.find_segment(store.time_limit()).unwrap(), 1);
    }

    #[test]
    fn last_real_knot_is_in_range_for_every_size() {
        // 10 and 15: (n - 1) * step - 2 * step rounds above (n - 3) * step.
        for n in [10u32, 15, 20, 27, 40, 63] {
            let store = line(n);
            let count = store.len();
            let last = &store.waypoints()[count - 2];
            assert_eq!(store.time_limit(), last.time, "n={n}");
            let eval = store.evaluator();
            assert_eq!(eval.find_segment(last.time).unwrap(), count - 3, "n={n}");
            let (_, u) = eval.locate(last.time).unwrap();
            assert_eq!(u, 1.0);
            assert_eq!(eval.evaluate_position(last.time).unwrap(), last.position);
        }
    }

    #[test]
    fn breakdown_reports_control_points() {
        let store = line(5);
        let b = store.evaluator().position_breakdown(0.25).unwrap();
        assert_eq!(b.segment, 1);
        assert_relative_eq!(b.local_t, 0.5, epsilon = 1e-6);
        assert_eq!(b.control_points[0], Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(b.control_points[3], Vector3::new(3.0, 0.0, 0.0));
        let text = b.to_string();
        assert!(text.starts_with("Waypoints count: 5"));
        assert!(text.contains("Result: (1.500, 0.000, 0.000)"));
    }

    #[test]
    fn lookahead_faces_along_the_path() {
        let store = line(5);
        let q = store.evaluator().evaluate_lookahead_orientation(0.2, 0.1).unwrap();
        let forward = q * Vector3::z();
        assert_relative_eq!(forward, Vector3::x(), epsilon = 1e-5);
    }

    #[test]
    fn lookahead_at_limit_is_degenerate() {
        let store = line(5);
        let err = store
            .evaluator()
            .evaluate_lookahead_orientation(store.time_limit(), 0.1)
            .unwrap_err();
        assert!(matches!(err, SplineError::DegenerateInterpolation { .. }));
    }
}
