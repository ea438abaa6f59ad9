//! Vizij Spline Core (engine-agnostic)
//!
//! A time-parameterized waypoint spline: waypoints are registered one at a
//! time, the whole sequence is re-timed uniformly on every append, and
//! queries return Catmull-Rom positions and SQUAD orientations.
//!
//! ```
//! use nalgebra::{UnitQuaternion, Vector3};
//! use vizij_spline_core::{OriginId, WaypointStore};
//!
//! let mut store = WaypointStore::new();
//! for i in 0..4 {
//!     store
//!         .register(OriginId(i), Vector3::new(i as f32, 0.0, 0.0), UnitQuaternion::identity())
//!         .unwrap();
//! }
//! let p = store.evaluator().evaluate_position(0.0).unwrap();
//! assert_eq!(p, Vector3::new(1.0, 0.0, 0.0));
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod ids;
pub mod interp;
pub mod store;
pub mod waypoint;

// Re-exports for consumers (rigs, adapters)
pub use config::SplineConfig;
pub use error::SplineError;
pub use evaluator::{PositionBreakdown, SplineEvaluator, SplineSample};
pub use events::{Listener, SplineEvent};
pub use ids::{ListenerId, OriginId};
pub use store::{Registration, RetimePolicy, SplineState, WaypointStore, MIN_WAYPOINTS};
pub use waypoint::Waypoint;

/// Spline result type
pub type Result<T> = core::result::Result<T, SplineError>;
