//! Variable store: the confirm-or-rollback state machine.
//!
//! Every local edit is speculative. Writing it snapshots the previous set as
//! the backup and opens a watchdog window. An authoritative message from the
//! peer (an acknowledgement, or a fresh push of the whole set) promotes the
//! current values to trusted. If the window expires first, the owner's
//! supervision pass calls [`VariableStore::check_streaming_fail`] and the
//! store reverts to the backup.
//!
//! The store performs no I/O. Its timer is observed by the owner through
//! [`VariableStore::expired`], and operations that demand an immediate
//! supervision pass say so by returning [`Firing::Immediate`].

use crate::error::SyncResult;
use crate::timer::{DelayTimer, Firing};
use panelsync_types::{ControlSchema, Payload, Value, VariableSet};
use std::time::Duration;
use tracing::{debug, info};

/// Where the current round trip stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamingStatus {
    /// No round trip in flight.
    #[default]
    Idle,
    /// A local change was sent and awaits confirmation.
    Pending,
    /// The peer acknowledged, or pushed new data; awaiting the settle pass.
    Confirmed,
}

/// Owns the current and backup variable sets and the round-trip watchdog.
///
/// The watchdog is armed whenever the status is `Pending`. A `Confirmed`
/// status holds a window open only until the next supervision pass resets
/// the store to `Idle`.
#[derive(Debug)]
pub struct VariableStore {
    current: VariableSet,
    backup: VariableSet,
    schema: ControlSchema,
    status: StreamingStatus,
    enabled: bool,
    timer: DelayTimer,
}

impl VariableStore {
    /// Creates an enabled store. The keys of `initial` become the fixed
    /// recognized control set.
    pub fn new(initial: VariableSet, round_trip_timeout: Duration) -> Self {
        Self {
            schema: ControlSchema::from_set(&initial),
            backup: initial.clone(),
            current: initial,
            status: StreamingStatus::Idle,
            enabled: true,
            timer: DelayTimer::new(round_trip_timeout),
        }
    }

    /// Builder form of [`set_enabled`](Self::set_enabled).
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Returns the current value of `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.current.get(key)
    }

    /// Returns the current set. Mutation goes through `set` and `update`.
    pub fn values(&self) -> &VariableSet {
        &self.current
    }

    /// Returns the rollback target.
    pub fn backup(&self) -> &VariableSet {
        &self.backup
    }

    pub fn schema(&self) -> &ControlSchema {
        &self.schema
    }

    pub fn status(&self) -> StreamingStatus {
        self.status
    }

    /// Whether the peer confirmed the current values.
    pub fn streamed(&self) -> bool {
        self.status == StreamingStatus::Confirmed
    }

    /// Whether round trips should be attempted at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn timer(&self) -> &DelayTimer {
        &self.timer
    }

    /// Serialized text form of the current set.
    pub fn json(&self) -> SyncResult<String> {
        Ok(self.current.to_json()?)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Enables or disables round trips. Disabling drops any window in flight.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.status = StreamingStatus::Idle;
            self.timer.stop();
        }
    }

    /// Writes `value` at `key`.
    ///
    /// With `snapshot_first`, the current set is copied into the backup
    /// before the write. The confirmation flag is then set to
    /// `mark_confirmed`, which re-arms the watchdog. Unknown keys and kind
    /// mismatches are rejected without touching any state.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        snapshot_first: bool,
        mark_confirmed: bool,
    ) -> SyncResult<()> {
        let value = value.into();
        self.schema.check_assignment(key, &value)?;
        if snapshot_first {
            self.backup = self.current.clone();
        }
        self.current.replace(key, value)?;
        debug!("Set {} = {}", key, value);
        self.set_streaming_status(mark_confirmed);
        Ok(())
    }

    /// Overwrites the current set with the backup.
    pub fn restore(&mut self) {
        self.current = self.backup.clone();
    }

    /// Replaces both sets with an authoritative set from the peer and marks
    /// it confirmed.
    ///
    /// The payload is resolved and validated first; a malformed or
    /// mismatched payload fails without touching any state. On success the
    /// caller must run a supervision pass now.
    pub fn update(&mut self, data: impl Into<Payload>) -> SyncResult<Firing> {
        let incoming = data.into().into_variables()?;
        self.schema.validate(&incoming)?;
        self.backup = incoming.clone();
        self.current = incoming;
        self.set_streaming_status(true);
        Ok(self.timer.resume(true))
    }

    /// Sets the confirmation flag. Every write re-arms the watchdog.
    ///
    /// A disabled store never enters `Pending`.
    pub fn set_streaming_status(&mut self, confirmed: bool) {
        if confirmed {
            self.status = StreamingStatus::Confirmed;
        } else if self.enabled {
            self.status = StreamingStatus::Pending;
        } else {
            self.status = StreamingStatus::Idle;
            self.timer.stop();
            return;
        }
        self.timer.reset();
    }

    /// Opens the confirmation countdown after an optimistic write was sent.
    pub fn wait_response(&mut self) {
        self.timer.start();
    }

    /// Rolls back to the backup if the round trip was never confirmed.
    /// Returns whether a rollback happened.
    pub fn check_streaming_fail(&mut self) -> bool {
        if self.status != StreamingStatus::Pending {
            return false;
        }
        info!("Round trip unconfirmed, restoring {}", self.backup);
        self.restore();
        true
    }

    /// Returns to the idle baseline with the watchdog disarmed.
    pub fn reset_streaming_status(&mut self) {
        self.status = StreamingStatus::Idle;
        self.timer.pause();
    }

    /// The peer acknowledged the last change. The caller must run a
    /// supervision pass now.
    pub fn streamed_successfully(&mut self) -> Firing {
        debug!("Round trip confirmed");
        self.set_streaming_status(true);
        self.timer.resume(true)
    }

    /// Disarms the watchdog for good.
    pub fn stop(&mut self) {
        self.timer.stop();
    }

    /// Completes when the watchdog window expires.
    pub async fn expired(&mut self) {
        self.timer.expired().await;
    }
}
