//! State transition log.
//!
//! A [`StatesMan`] records state changes reported by named subsystems,
//! tracks each subsystem's latest state, answers filtered queries over the
//! history and publishes every change on a bounded channel.
//!
//! # Example
//!
//! ```
//! use shardlog::{StatePayload, StatesMan, Timestamp};
//!
//! let sm = StatesMan::new("jobs");
//! let notes = sm.notifications();
//!
//! sm.record_transition("worker1", "", "created", Timestamp(1), StatePayload::new());
//! sm.record_transition("worker1", "created", "started", Timestamp(2), StatePayload::new());
//!
//! assert_eq!(sm.get_state("worker1").unwrap().as_str(), "started");
//! assert_eq!(notes.drain().len(), 2);
//! ```

mod export;
mod manager;
mod types;

pub use manager::StatesMan;
pub use types::{
    ChangeFilter, KnownState, NotificationReceiver, PruneFilter, StateChange, StatePayload,
    StateValue, StatesManConfig, StatesSnapshot,
};
