//! State reconciliation helpers
//!
//! Mutations are fire-and-forget; these helpers poll the canonical state
//! until it converges on a target, or fail with the last observation when
//! the deadline passes. A state outside the backend's vocabulary is
//! tolerated briefly mid-transition but fails the wait if it persists.

pub mod nexus;
pub mod poll;
pub mod pool;
pub mod volume;

pub use nexus::{exclude_nexus_replica, wait_for_nexus_children, ChildCounts};
pub use poll::{poll_until, Observation, PollSettings};
pub use pool::{wait_for_control_plane, wait_for_pools_online};
pub use volume::{
    wait_for_replica_count, wait_for_volume_degraded, wait_for_volume_deleted,
    wait_for_volume_healthy, wait_for_volume_state,
};
