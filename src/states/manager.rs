//! State transition log manager.

use crate::error::{Result, StatesError};
use crate::types::{SnapshotEncoding, Timestamp};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};

use super::export::{decode_snapshot, encode_snapshot, render_dot};
use super::types::{
    ChangeFilter, KnownState, NotificationReceiver, PruneFilter, StateChange, StatePayload,
    StateValue, StatesManConfig, StatesSnapshot,
};

/// Log and current-state table, guarded together.
struct StatesInner {
    name: String,
    /// Append order is chronological order.
    log: Vec<StateChange>,
    /// Subsystem -> `to` of its latest recorded change.
    current: HashMap<String, StateValue>,
}

/// Records state transitions reported by named subsystems.
///
/// This is a recorder, not a validating state machine: any transition may
/// be reported for any subsystem. Every recorded change is also pushed onto
/// a bounded notification channel, see [`StatesMan::notifications`].
pub struct StatesMan {
    inner: RwLock<StatesInner>,
    /// Serializes recorders so channel order matches log order. Held across
    /// the (possibly blocking) send, never while `inner` is held by a reader.
    sender: Mutex<Sender<StateChange>>,
    /// Kept so the channel never disconnects and handles can be cloned.
    receiver: Receiver<StateChange>,
}

impl StatesMan {
    /// Create a manager with the default notification capacity (10).
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, StatesManConfig::default())
    }

    /// Create a manager with a custom config.
    pub fn with_config(name: impl Into<String>, config: StatesManConfig) -> Self {
        // A zero-capacity channel would be a rendezvous, not a buffer.
        let (sender, receiver) = bounded(config.notification_capacity.max(1));

        Self {
            inner: RwLock::new(StatesInner {
                name: name.into(),
                log: Vec::new(),
                current: HashMap::new(),
            }),
            sender: Mutex::new(sender),
            receiver,
        }
    }

    pub fn name(&self) -> String {
        self.inner.read().name.clone()
    }

    /// The fixed state vocabulary.
    pub fn recognized_states(&self) -> &'static [KnownState] {
        &KnownState::ALL
    }

    /// Handle for consuming change notifications.
    pub fn notifications(&self) -> NotificationReceiver {
        NotificationReceiver {
            receiver: self.receiver.clone(),
        }
    }

    // --- Recording ---

    /// Record a transition and publish it on the notification channel.
    ///
    /// # Blocking
    ///
    /// If the notification buffer is full this call blocks until a consumer
    /// takes a change. With no consumer it blocks forever, and other
    /// recorders queue up behind it. Nothing is ever dropped. Readers are
    /// not affected: the log is already updated before the send starts.
    /// Use [`try_record_transition`](Self::try_record_transition) to avoid
    /// waiting for buffer space.
    pub fn record_transition(
        &self,
        subsystem: &str,
        from: impl Into<StateValue>,
        to: impl Into<StateValue>,
        timestamp: Timestamp,
        data: StatePayload,
    ) -> StateChange {
        let change = StateChange {
            subsystem: subsystem.to_string(),
            from: from.into(),
            to: to.into(),
            timestamp,
            data,
        };

        let sender = self.sender.lock();
        self.append(change.clone());

        if sender.send(change.clone()).is_err() {
            // Unreachable while we own a receiver.
            tracing::error!(subsystem, "notification channel disconnected");
        }

        change
    }

    /// Record a transition without waiting for notification buffer space.
    ///
    /// The change is always logged and the current state updated. If the
    /// buffer is full the notification is dropped and
    /// [`StatesError::NotificationBufferFull`] is returned. If another
    /// recorder is mid-send (usually parked in
    /// [`record_transition`](Self::record_transition) on a full buffer), the
    /// notification is dropped as well and
    /// [`StatesError::NotificationsBusy`] is returned. Never blocks.
    pub fn try_record_transition(
        &self,
        subsystem: &str,
        from: impl Into<StateValue>,
        to: impl Into<StateValue>,
        timestamp: Timestamp,
        data: StatePayload,
    ) -> Result<StateChange> {
        let change = StateChange {
            subsystem: subsystem.to_string(),
            from: from.into(),
            to: to.into(),
            timestamp,
            data,
        };

        let Some(sender) = self.sender.try_lock() else {
            self.append(change);
            tracing::warn!(subsystem, "notification sender busy, dropping notification");
            return Err(StatesError::NotificationsBusy {
                subsystem: subsystem.to_string(),
            });
        };
        self.append(change.clone());

        match sender.try_send(change.clone()) {
            Ok(()) => Ok(change),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(subsystem, "notification buffer full, dropping notification");
                Err(StatesError::NotificationBufferFull {
                    subsystem: subsystem.to_string(),
                })
            }
            Err(TrySendError::Disconnected(_)) => Err(StatesError::NotificationsDisconnected),
        }
    }

    fn append(&self, change: StateChange) {
        let mut inner = self.inner.write();

        if !change.to.is_recognized() {
            tracing::warn!(
                manager = %inner.name,
                subsystem = %change.subsystem,
                state = %change.to,
                "recording unrecognized state"
            );
        }
        tracing::debug!(
            manager = %inner.name,
            subsystem = %change.subsystem,
            from = %change.from,
            to = %change.to,
            "recorded state change"
        );

        inner
            .current
            .insert(change.subsystem.clone(), change.to.clone());
        inner.log.push(change);
    }

    // --- Queries ---

    /// Current state of a subsystem, `None` if nothing was recorded.
    pub fn get_state(&self, subsystem: &str) -> Option<StateValue> {
        self.inner.read().current.get(subsystem).cloned()
    }

    /// All changes for a subsystem, oldest first.
    pub fn state_changes_for(&self, subsystem: &str) -> Vec<StateChange> {
        self.inner
            .read()
            .log
            .iter()
            .filter(|c| c.subsystem == subsystem)
            .cloned()
            .collect()
    }

    /// Changes matching every set field of `filter`, oldest first.
    pub fn filtered_state_changes(&self, filter: &ChangeFilter) -> Vec<StateChange> {
        self.inner
            .read()
            .log
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    /// Snapshot of the current-state table.
    pub fn current_states(&self) -> BTreeMap<String, StateValue> {
        self.inner
            .read()
            .current
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Subsystems with a recorded state, sorted.
    pub fn subsystems(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().current.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of logged changes.
    pub fn len(&self) -> usize {
        self.inner.read().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().log.is_empty()
    }

    // --- Pruning ---

    /// Permanently remove matching changes. Returns how many were removed.
    ///
    /// The current-state table is left as is.
    pub fn prune_state_changes(&self, filter: &PruneFilter) -> usize {
        let mut inner = self.inner.write();
        let before = inner.log.len();
        inner.log.retain(|c| !filter.matches(c));
        let removed = before - inner.log.len();

        tracing::debug!(manager = %inner.name, removed, "pruned state changes");
        removed
    }

    // --- Vocabulary checks ---

    /// Whether `state` is in the recognized vocabulary.
    ///
    /// This does not compare against the subsystem's current state.
    pub fn check_state(&self, subsystem: &str, state: &StateValue) -> bool {
        let ok = state.is_recognized();
        if !ok {
            tracing::trace!(subsystem, state = %state, "state not in vocabulary");
        }
        ok
    }

    /// Whether every state in `states` is in the recognized vocabulary.
    pub fn check_states(&self, states: &HashMap<String, StateValue>) -> bool {
        states
            .iter()
            .all(|(subsystem, state)| self.check_state(subsystem, state))
    }

    // --- Export ---

    pub fn snapshot(&self) -> StatesSnapshot {
        let inner = self.inner.read();
        StatesSnapshot {
            name: inner.name.clone(),
            changes: inner.log.clone(),
            current: inner
                .current
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Encode the log and current-state table.
    pub fn export(&self, encoding: SnapshotEncoding) -> Result<Vec<u8>> {
        encode_snapshot(&self.snapshot(), encoding)
    }

    /// Replace name, log and current-state table with an exported snapshot.
    ///
    /// Nothing is published on the notification channel.
    pub fn import(&self, bytes: &[u8], encoding: SnapshotEncoding) -> Result<()> {
        let snapshot = decode_snapshot(bytes, encoding)?;

        let mut inner = self.inner.write();
        inner.name = snapshot.name;
        inner.log = snapshot.changes;
        inner.current = snapshot.current.into_iter().collect();

        tracing::info!(manager = %inner.name, changes = inner.log.len(), "imported state log");
        Ok(())
    }

    /// Graphviz rendering of the transitions seen so far.
    pub fn to_dot(&self) -> String {
        let inner = self.inner.read();
        render_dot(&inner.name, &inner.log)
    }
}
