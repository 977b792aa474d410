//! Containment journal — bounded append-only log of lifecycle events
//!
//! The registry keeps only the latest record per session, so a
//! re-quarantine overwrites the previous lifecycle. The journal keeps every
//! quarantine, release, and purge as a separate event until it is evicted
//! by capacity.

use crate::types::{QuarantineRecord, ThreatLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What happened to a session's record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentEventKind {
    /// A new record was created
    Quarantined,
    /// A record was marked released
    Released,
    /// A released record was removed by retention cleanup
    Purged,
}

/// A single lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentEvent {
    /// Unique event ID
    pub id: String,
    /// Session the record belongs to
    pub session_id: String,
    /// Lifecycle transition
    pub kind: ContainmentEventKind,
    /// Threat level stamped on the record
    pub threat_level: ThreatLevel,
    /// Reason stored on the record
    pub reason: String,
    /// When the transition happened
    pub timestamp: DateTime<Utc>,
}

impl ContainmentEvent {
    /// Build an event describing `record` at `timestamp`
    pub fn from_record(
        kind: ContainmentEventKind,
        record: &QuarantineRecord,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("cte-{}", uuid::Uuid::new_v4()),
            session_id: record.session_id.clone(),
            kind,
            threat_level: record.threat_level,
            reason: record.reason.clone(),
            timestamp,
        }
    }
}

/// In-memory journal with bounded capacity
#[derive(Debug)]
pub struct ContainmentJournal {
    events: VecDeque<ContainmentEvent>,
    capacity: usize,
    /// Total events recorded (including evicted)
    total_recorded: u64,
}

impl ContainmentJournal {
    /// Create a journal retaining at most `capacity` events
    ///
    /// A capacity of 0 keeps nothing but still counts recorded events.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total_recorded: 0,
        }
    }

    /// Append an event, evicting the oldest beyond capacity
    pub fn record(&mut self, event: ContainmentEvent) {
        self.total_recorded += 1;
        if self.capacity == 0 {
            return;
        }
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Most recent events, newest first
    pub fn recent(&self, limit: usize) -> Vec<ContainmentEvent> {
        self.events.iter().rev().take(limit).cloned().collect()
    }

    /// Retained events for one session, oldest first
    pub fn for_session(&self, session_id: &str) -> Vec<ContainmentEvent> {
        self.events
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are retained
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events recorded since creation, including evicted ones
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }
}

impl Default for ContainmentJournal {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_JOURNAL_CAPACITY)
    }
}
