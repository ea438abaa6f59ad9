//! Notifications emitted by the waypoint store.
//!
//! Listeners run synchronously at the end of a re-timing pass. They receive
//! the event by reference only and cannot reach the store, which stays
//! mutably borrowed for the whole dispatch.

use serde::{Deserialize, Serialize};

use crate::ids::{ListenerId, OriginId};

/// Discrete signals emitted while the store is re-timed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SplineEvent {
    /// A waypoint received a new time; hosts mirror it onto the origin object.
    WaypointTimed { origin: OriginId, time: f32 },
    /// Timing completed; `time_limit` is the largest valid query time.
    Retimed { time_limit: f32 },
    /// Timing failed and the store entered `SplineState::Invalid`.
    TimingInvalidated { index: usize },
}

pub type Listener = Box<dyn FnMut(&SplineEvent) + Send>;

/// Ordered set of listeners, called in subscription order.
#[derive(Default)]
pub(crate) struct ListenerSet {
    next: u32,
    entries: Vec<(ListenerId, Listener)>,
}

impl ListenerSet {
    pub(crate) fn insert(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next);
        self.next = self.next.wrapping_add(1);
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn emit(&mut self, event: &SplineEvent) {
        for (_, listener) in self.entries.iter_mut() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.entries.len())
            .finish()
    }
}
