//! Types for the state transition log.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Arbitrary key-value data attached to a state change.
pub type StatePayload = BTreeMap<String, serde_json::Value>;

/// The fixed state vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownState {
    Created,
    Started,
    Stopped,
    Paused,
    Resumed,
    Completed,
    Failed,
    Terminated,
}

impl KnownState {
    /// Every recognized state, in declaration order.
    pub const ALL: [KnownState; 8] = [
        KnownState::Created,
        KnownState::Started,
        KnownState::Stopped,
        KnownState::Paused,
        KnownState::Resumed,
        KnownState::Completed,
        KnownState::Failed,
        KnownState::Terminated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KnownState::Created => "created",
            KnownState::Started => "started",
            KnownState::Stopped => "stopped",
            KnownState::Paused => "paused",
            KnownState::Resumed => "resumed",
            KnownState::Completed => "completed",
            KnownState::Failed => "failed",
            KnownState::Terminated => "terminated",
        }
    }

    /// Look up a token in the vocabulary.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == token)
    }
}

impl fmt::Display for KnownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque state token.
///
/// Any string is accepted; membership in the vocabulary is checked
/// separately. The empty token means "no state yet".
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct StateValue(String);

impl StateValue {
    pub fn new(token: impl Into<String>) -> Self {
        StateValue(token.into())
    }

    /// The unset sentinel.
    pub fn unset() -> Self {
        StateValue(String::new())
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this token belongs to the fixed vocabulary.
    pub fn is_recognized(&self) -> bool {
        self.known().is_some()
    }

    pub fn known(&self) -> Option<KnownState> {
        KnownState::parse(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State({:?})", self.0)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue(s)
    }
}

impl From<KnownState> for StateValue {
    fn from(s: KnownState) -> Self {
        StateValue(s.as_str().to_string())
    }
}

impl PartialEq<KnownState> for StateValue {
    fn eq(&self, other: &KnownState) -> bool {
        self.0 == other.as_str()
    }
}

impl PartialEq<&str> for StateValue {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One recorded transition. Never modified after it is logged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub subsystem: String,
    pub from: StateValue,
    pub to: StateValue,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub data: StatePayload,
}

/// Query filter. Unset fields match everything; time bounds are inclusive.
#[derive(Clone, Debug, Default)]
pub struct ChangeFilter {
    pub subsystem: Option<String>,
    pub from_state: Option<StateValue>,
    pub to_state: Option<StateValue>,
    pub since: Option<Timestamp>,
    pub until: Option<Timestamp>,
}

impl ChangeFilter {
    /// Match everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn subsystem(mut self, name: impl Into<String>) -> Self {
        self.subsystem = Some(name.into());
        self
    }

    pub fn from_state(mut self, state: impl Into<StateValue>) -> Self {
        self.from_state = Some(state.into());
        self
    }

    pub fn to_state(mut self, state: impl Into<StateValue>) -> Self {
        self.to_state = Some(state.into());
        self
    }

    pub fn since(mut self, ts: Timestamp) -> Self {
        self.since = Some(ts);
        self
    }

    pub fn until(mut self, ts: Timestamp) -> Self {
        self.until = Some(ts);
        self
    }

    pub fn matches(&self, change: &StateChange) -> bool {
        if let Some(ref name) = self.subsystem {
            if &change.subsystem != name {
                return false;
            }
        }
        if let Some(ref from) = self.from_state {
            if &change.from != from {
                return false;
            }
        }
        if let Some(ref to) = self.to_state {
            if &change.to != to {
                return false;
            }
        }
        within(change.timestamp, self.since, self.until)
    }
}

/// Which records to prune. Unset fields leave that dimension unconstrained.
#[derive(Clone, Debug, Default)]
pub struct PruneFilter {
    pub subsystem: Option<String>,
    pub since: Option<Timestamp>,
    pub until: Option<Timestamp>,
}

impl PruneFilter {
    pub fn subsystem(mut self, name: impl Into<String>) -> Self {
        self.subsystem = Some(name.into());
        self
    }

    pub fn since(mut self, ts: Timestamp) -> Self {
        self.since = Some(ts);
        self
    }

    pub fn until(mut self, ts: Timestamp) -> Self {
        self.until = Some(ts);
        self
    }

    pub fn matches(&self, change: &StateChange) -> bool {
        if let Some(ref name) = self.subsystem {
            if &change.subsystem != name {
                return false;
            }
        }
        within(change.timestamp, self.since, self.until)
    }
}

fn within(ts: Timestamp, since: Option<Timestamp>, until: Option<Timestamp>) -> bool {
    since.map_or(true, |s| ts >= s) && until.map_or(true, |u| ts <= u)
}

/// Configuration for a [`StatesMan`](super::StatesMan).
#[derive(Clone, Debug)]
pub struct StatesManConfig {
    /// Notification buffer size. Writers block once it is full.
    /// Default: 10
    pub notification_capacity: usize,
}

impl Default for StatesManConfig {
    fn default() -> Self {
        Self {
            notification_capacity: 10,
        }
    }
}

/// Serializable copy of a manager's log and current-state table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatesSnapshot {
    pub name: String,
    pub changes: Vec<StateChange>,
    pub current: BTreeMap<String, StateValue>,
}

/// Receiving end of a manager's notification channel.
///
/// All handles share one queue: each change is delivered to exactly one
/// handle.
#[derive(Clone)]
pub struct NotificationReceiver {
    pub(crate) receiver: crossbeam_channel::Receiver<StateChange>,
}

impl NotificationReceiver {
    /// Receive the next change (blocking).
    pub fn recv(&self) -> Result<StateChange, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a change (non-blocking).
    pub fn try_recv(&self) -> Result<StateChange, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<StateChange, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take everything currently buffered.
    pub fn drain(&self) -> Vec<StateChange> {
        self.receiver.try_iter().collect()
    }

    /// Number of buffered changes.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
