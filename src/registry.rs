//! Containment registry — quarantine state per session
//!
//! `ContainmentRegistry` owns the current quarantine record for every
//! session it has seen, answers containment queries, and applies the
//! retention policy when asked. Thread-safe via internal locks; share it
//! between callers with an `Arc`.

use crate::clock::{Clock, SystemClock};
use crate::config::ContainmentConfig;
use crate::error::Result;
use crate::journal::{ContainmentEvent, ContainmentEventKind, ContainmentJournal};
use crate::types::{ContainmentStats, QuarantineRecord, ThreatLevel};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Default retention window for `clear_old_records` (24 hours)
pub const DEFAULT_RETENTION_MS: u64 = 86_400_000;

/// In-memory registry of quarantined sessions
///
/// Stores at most one record per session id. A session with an active
/// record cannot be quarantined again until it is released; quarantining a
/// released session starts a new lifecycle and replaces the old record.
pub struct ContainmentRegistry {
    config: ContainmentConfig,
    clock: Arc<dyn Clock>,

    /// Current record per session (session_id → record)
    records: RwLock<HashMap<String, QuarantineRecord>>,

    /// Lifecycle events that survive record replacement
    journal: Mutex<ContainmentJournal>,

    tx: broadcast::Sender<ContainmentEvent>,
}

impl ContainmentRegistry {
    /// Create a registry using the system clock
    ///
    /// Fails with `ContainmentError::Config` if the configuration is invalid.
    pub fn new(config: ContainmentConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a registry reading time from `clock`
    pub fn with_clock(config: ContainmentConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: ContainmentConfig, clock: Arc<dyn Clock>) -> Self {
        let (tx, _rx) = broadcast::channel(config.event_capacity);
        let journal = ContainmentJournal::new(config.journal_capacity);
        Self {
            config,
            clock,
            records: RwLock::new(HashMap::new()),
            journal: Mutex::new(journal),
            tx,
        }
    }

    /// The configuration this registry was built with
    pub fn config(&self) -> &ContainmentConfig {
        &self.config
    }

    /// Quarantine a session at the configured auto-contain threshold
    ///
    /// Returns `false` without touching the stored record if the session is
    /// already quarantined. The record is stamped with
    /// `config.auto_contain_threshold`, not the severity of the detection;
    /// use [`quarantine_with_level`](Self::quarantine_with_level) to record
    /// the detected level.
    pub fn quarantine(&self, session_id: &str, reason: &str) -> bool {
        self.insert(session_id, reason, self.config.auto_contain_threshold)
    }

    /// Quarantine a session, recording the detected threat level
    pub fn quarantine_with_level(&self, session_id: &str, reason: &str, level: ThreatLevel) -> bool {
        self.insert(session_id, reason, level)
    }

    fn insert(&self, session_id: &str, reason: &str, level: ThreatLevel) -> bool {
        let now = self.clock.now();
        let mut records = self.write_records();

        if records.get(session_id).is_some_and(QuarantineRecord::is_active) {
            tracing::debug!(session_id = %session_id, "Session already quarantined");
            return false;
        }

        let record = QuarantineRecord::new(session_id, reason, level, now);
        let replaced = records.insert(session_id.to_string(), record.clone()).is_some();
        self.emit(ContainmentEventKind::Quarantined, &record, now);

        tracing::info!(
            session_id = %session_id,
            threat_level = %level,
            reason = %reason,
            replaced,
            "Session quarantined"
        );
        true
    }

    /// Release a session's quarantine
    ///
    /// Returns `false` only when no record exists. Releasing an already
    /// released record succeeds again and moves `released_at` forward, which
    /// lengthens the measured quarantine time until the record is cleaned up.
    pub fn release(&self, session_id: &str) -> bool {
        let now = self.clock.now();
        let mut records = self.write_records();

        let Some(record) = records.get_mut(session_id) else {
            tracing::debug!(session_id = %session_id, "Release requested for unknown session");
            return false;
        };

        if record.released {
            tracing::warn!(
                session_id = %session_id,
                previous_release = ?record.released_at,
                "Session released again, overwriting release time"
            );
        }
        record.released = true;
        record.released_at = Some(now);

        let record = record.clone();
        self.emit(ContainmentEventKind::Released, &record, now);

        tracing::info!(
            session_id = %session_id,
            duration_ms = record.duration().map(|d| d.num_milliseconds()),
            "Session released"
        );
        true
    }

    /// Whether the session has an active (unreleased) record
    pub fn is_quarantined(&self, session_id: &str) -> bool {
        self.read_records()
            .get(session_id)
            .is_some_and(QuarantineRecord::is_active)
    }

    /// The stored record for a session, if any
    pub fn get_record(&self, session_id: &str) -> Option<QuarantineRecord> {
        self.read_records().get(session_id).cloned()
    }

    /// All active records, in no particular order
    pub fn get_quarantined_sessions(&self) -> Vec<QuarantineRecord> {
        self.read_records()
            .values()
            .filter(|r| r.is_active())
            .cloned()
            .collect()
    }

    /// All stored records, released or not, in no particular order
    ///
    /// This is a snapshot of the latest record per session, not a full
    /// audit trail. See [`journal`](Self::journal) for lifecycle history.
    pub fn get_history(&self) -> Vec<QuarantineRecord> {
        self.read_records().values().cloned().collect()
    }

    /// Whether a detection at `threat_level` should be contained automatically
    pub fn should_auto_contain(&self, threat_level: ThreatLevel) -> bool {
        threat_level >= self.config.auto_contain_threshold
    }

    /// Counts and mean quarantine duration over the stored records
    pub fn get_stats(&self) -> ContainmentStats {
        let records = self.read_records();
        let mut stats = ContainmentStats {
            total_quarantined: records.len(),
            ..ContainmentStats::default()
        };

        let mut total_ms = 0f64;
        let mut measured = 0usize;
        for record in records.values() {
            if record.released {
                stats.released += 1;
            } else {
                stats.currently_quarantined += 1;
            }
            if let Some(duration) = record.duration() {
                total_ms += duration_ms(duration);
                measured += 1;
            }
        }

        if measured > 0 {
            stats.average_quarantine_time = total_ms / measured as f64;
        }
        stats
    }

    /// Remove released records whose release is older than `older_than_ms`
    ///
    /// Active records, and released records without a release time, are
    /// never removed. Returns the number of records removed.
    pub fn clear_old_records(&self, older_than_ms: u64) -> usize {
        let now = self.clock.now();
        let Some(cutoff) = cutoff(now, older_than_ms) else {
            return 0;
        };

        let mut records = self.write_records();
        let expired: Vec<String> = records
            .values()
            .filter(|r| r.released && r.released_at.is_some_and(|at| at < cutoff))
            .map(|r| r.session_id.clone())
            .collect();

        for session_id in &expired {
            if let Some(record) = records.remove(session_id) {
                self.emit(ContainmentEventKind::Purged, &record, now);
            }
        }

        if !expired.is_empty() {
            tracing::info!(
                removed = expired.len(),
                remaining = records.len(),
                older_than_ms,
                "Old quarantine records cleared"
            );
        }
        expired.len()
    }

    /// `clear_old_records` with the default 24 hour window
    pub fn clear_old_records_default(&self) -> usize {
        self.clear_old_records(DEFAULT_RETENTION_MS)
    }

    /// Active records older than `max_quarantine_duration_ms`
    ///
    /// Always empty when no maximum is configured. Nothing is released;
    /// callers decide what to do with expired sessions.
    pub fn expired_sessions(&self) -> Vec<QuarantineRecord> {
        let Some(max_ms) = self.config.max_quarantine_duration_ms else {
            return Vec::new();
        };
        let now = self.clock.now();
        let Some(cutoff) = cutoff(now, max_ms) else {
            return Vec::new();
        };

        self.read_records()
            .values()
            .filter(|r| r.is_active() && r.created_at < cutoff)
            .cloned()
            .collect()
    }

    /// Subscribe to lifecycle events
    ///
    /// Receivers that fall behind see `RecvError::Lagged` and can skip to
    /// the latest events.
    pub fn subscribe(&self) -> broadcast::Receiver<ContainmentEvent> {
        self.tx.subscribe()
    }

    /// Most recent journal events, newest first
    pub fn journal(&self, limit: usize) -> Vec<ContainmentEvent> {
        self.lock_journal().recent(limit)
    }

    /// Retained journal events for one session, oldest first
    pub fn journal_for_session(&self, session_id: &str) -> Vec<ContainmentEvent> {
        self.lock_journal().for_session(session_id)
    }

    /// Lifecycle events recorded since creation, including evicted ones
    pub fn journal_total(&self) -> u64 {
        self.lock_journal().total_recorded()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.read_records().len()
    }

    /// Whether no records are stored
    pub fn is_empty(&self) -> bool {
        self.read_records().is_empty()
    }

    fn emit(&self, kind: ContainmentEventKind, record: &QuarantineRecord, at: DateTime<Utc>) {
        let event = ContainmentEvent::from_record(kind, record, at);
        self.lock_journal().record(event.clone());
        // No receivers is fine; the journal already has the event.
        let _ = self.tx.send(event);
    }

    // Every critical section leaves the map consistent, so a poisoned lock
    // is still safe to use.
    fn read_records(&self) -> RwLockReadGuard<'_, HashMap<String, QuarantineRecord>> {
        self.records.read().unwrap_or_else(|e| {
            tracing::warn!("Recovering poisoned containment registry lock");
            e.into_inner()
        })
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, HashMap<String, QuarantineRecord>> {
        self.records.write().unwrap_or_else(|e| {
            tracing::warn!("Recovering poisoned containment registry lock");
            e.into_inner()
        })
    }

    fn lock_journal(&self) -> MutexGuard<'_, ContainmentJournal> {
        self.journal.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ContainmentRegistry {
    fn default() -> Self {
        Self::build(ContainmentConfig::default(), Arc::new(SystemClock))
    }
}

/// Duration in fractional milliseconds, at microsecond precision when it fits
fn duration_ms(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(us) => us as f64 / 1000.0,
        None => duration.num_milliseconds() as f64,
    }
}

/// `now - window_ms`, or `None` when the window reaches before the representable range
fn cutoff(now: DateTime<Utc>, window_ms: u64) -> Option<DateTime<Utc>> {
    let window = i64::try_from(window_ms)
        .ok()
        .and_then(Duration::try_milliseconds)?;
    now.checked_sub_signed(window)
}
