//! Identifiers for waypoint origins and event listeners.

use serde::{Deserialize, Serialize};

/// Opaque identity of the external object that produced a waypoint.
/// The store only compares and reports it; it never resolves it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct OriginId(pub u32);

/// Handle returned by `WaypointStore::subscribe`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u32);
