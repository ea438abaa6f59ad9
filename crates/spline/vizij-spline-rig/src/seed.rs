//! JSON path documents used to populate a `WaypointStore`.
//!
//! ```json
//! { "name": "loop", "waypoints": [
//!     { "origin": 0, "position": [0, 0, 0], "orientation": [0, 0, 0, 1] }
//! ] }
//! ```
//!
//! Orientations are `[x, y, z, w]` and are normalized on load.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use vizij_spline_core::{OriginId, Registration, WaypointStore};

use crate::{Result, RigError};

const MIN_QUAT_NORM: f32 = 1e-6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaypointSeed {
    pub origin: OriginId,
    pub position: [f32; 3],
    #[serde(default = "identity_xyzw")]
    pub orientation: [f32; 4],
}

fn identity_xyzw() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl WaypointSeed {
    #[inline]
    pub fn position(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }

    /// Normalized orientation, or `None` for a zero-length quaternion.
    pub fn orientation(&self) -> Option<UnitQuaternion<f32>> {
        let [x, y, z, w] = self.orientation;
        UnitQuaternion::try_new(Quaternion::new(w, x, y, z), MIN_QUAT_NORM)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSeed {
    #[serde(default)]
    pub name: String,
    pub waypoints: Vec<WaypointSeed>,
}

impl PathSeed {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Register every waypoint in order with `WaypointStore::register`.
    ///
    /// Stops at the first failure; waypoints registered before it stay in
    /// the store.
    pub fn apply(&self, store: &mut WaypointStore) -> Result<Vec<Registration>> {
        self.waypoints
            .iter()
            .map(|w| {
                let orientation = w.orientation().ok_or_else(|| RigError::InvalidSeed {
                    name: self.name.clone(),
                    reason: format!("waypoint {:?} has a zero-length orientation", w.origin),
                })?;
                Ok(store.register(w.origin, w.position(), orientation)?)
            })
            .collect()
    }
}
