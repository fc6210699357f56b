//! # shardlog
//!
//! Two independent in-process building blocks.
//!
//! ## Core Concepts
//!
//! - **Sharded map**: a hash map split into independently locked shards,
//!   placed by FNV hash of the key's display form
//! - **State log**: per-subsystem state transitions with timestamps and
//!   payload data, queryable, prunable, and published on a bounded channel
//!
//! ## Example
//!
//! ```
//! use shardlog::{ChangeFilter, KnownState, ShardedMap, StatePayload, StatesMan, Timestamp};
//!
//! let sessions: ShardedMap<String, u32> = ShardedMap::new(16);
//! sessions.set("alice".to_string(), 1);
//! assert!(!sessions.set_if_absent("alice".to_string(), 2));
//!
//! let sm = StatesMan::new("jobs");
//! sm.record_transition("build", "", KnownState::Created, Timestamp::now(), StatePayload::new());
//! sm.record_transition("build", KnownState::Created, KnownState::Completed, Timestamp::now(), StatePayload::new());
//!
//! let done = sm.filtered_state_changes(&ChangeFilter::all().to_state(KnownState::Completed));
//! assert_eq!(done.len(), 1);
//! ```

pub mod error;
pub mod map;
pub mod states;
pub mod types;

// Re-exports
pub use error::{Result, StatesError};
pub use map::{fnv32, ShardedMap, ShardedMapConfig, DEFAULT_SHARD_COUNT};
pub use states::{
    ChangeFilter, KnownState, NotificationReceiver, PruneFilter, StateChange, StatePayload,
    StateValue, StatesMan, StatesManConfig, StatesSnapshot,
};
pub use types::{SnapshotEncoding, Timestamp};
