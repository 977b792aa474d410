//! Core containment types
//!
//! All types use camelCase JSON serialization for wire compatibility.
//! Timestamps serialize as RFC 3339 strings; threat levels as integers 1–4.

use crate::error::ContainmentError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered severity scale for detected threats
///
/// `Low` is the least severe and `Critical` the most. Ordering follows the
/// numeric value, so `ThreatLevel::High >= ThreatLevel::Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum ThreatLevel {
    /// Suspicious but likely benign
    Low = 1,
    /// Probable threat
    Medium = 2,
    /// Confirmed threat
    High = 3,
    /// Active, severe threat
    Critical = 4,
}

impl ThreatLevel {
    /// All levels, least severe first
    pub const ALL: [ThreatLevel; 4] = [
        ThreatLevel::Low,
        ThreatLevel::Medium,
        ThreatLevel::High,
        ThreatLevel::Critical,
    ];

    /// Numeric value on the 1..=4 scale
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for ThreatLevel {
    type Error = ContainmentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ThreatLevel::Low),
            2 => Ok(ThreatLevel::Medium),
            3 => Ok(ThreatLevel::High),
            4 => Ok(ThreatLevel::Critical),
            other => Err(ContainmentError::InvalidThreatLevel(other)),
        }
    }
}

impl TryFrom<u8> for ThreatLevel {
    type Error = ContainmentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ThreatLevel::try_from(i64::from(value))
    }
}

impl From<ThreatLevel> for u8 {
    fn from(level: ThreatLevel) -> Self {
        level.as_u8()
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// A single quarantine action for a session
///
/// One record covers one quarantine-to-release lifecycle. Re-quarantining a
/// released session replaces its record with a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineRecord {
    /// Caller-supplied session identifier
    pub session_id: String,

    /// When the quarantine action happened
    #[serde(rename = "timestamp", alias = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Free-text justification
    pub reason: String,

    /// Whether the quarantine has ended
    pub released: bool,

    /// When the quarantine ended; absent while `released` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,

    /// Severity stamped at creation, never changed afterwards
    pub threat_level: ThreatLevel,
}

impl QuarantineRecord {
    /// Create an active record
    pub fn new(
        session_id: impl Into<String>,
        reason: impl Into<String>,
        threat_level: ThreatLevel,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            created_at,
            reason: reason.into(),
            released: false,
            released_at: None,
            threat_level,
        }
    }

    /// Whether this record still contains its session
    pub fn is_active(&self) -> bool {
        !self.released
    }

    /// Time spent in quarantine, if the record has been released
    pub fn duration(&self) -> Option<Duration> {
        match (self.released, self.released_at) {
            (true, Some(released_at)) => Some(released_at - self.created_at),
            _ => None,
        }
    }
}

/// Snapshot statistics over the stored records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentStats {
    /// All stored records (current snapshot, not all-time)
    pub total_quarantined: usize,

    /// Records not yet released
    pub currently_quarantined: usize,

    /// Released records still retained
    pub released: usize,

    /// Mean quarantine duration in milliseconds over released records, 0 when none
    pub average_quarantine_time: f64,
}
