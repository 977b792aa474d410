//! Containment configuration
//!
//! Supplied once by the host process and immutable for the lifetime of a
//! `ContainmentRegistry`.

use crate::error::{ContainmentError, Result};
use crate::types::ThreatLevel;
use serde::{Deserialize, Serialize};

/// Default journal capacity (lifecycle events retained)
pub const DEFAULT_JOURNAL_CAPACITY: usize = 10_000;

/// Default broadcast buffer for lifecycle event subscribers
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Largest broadcast buffer accepted (the ring buffer is allocated up front)
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Configuration for a containment registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainmentConfig {
    /// Severity at or above which callers should contain automatically
    pub auto_contain_threshold: ThreatLevel,

    /// Advisory maximum quarantine duration in milliseconds
    ///
    /// Never enforced by the registry. `expired_sessions()` reports the
    /// records that exceed it so callers can apply their own expiry policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_quarantine_duration_ms: Option<u64>,

    /// Max lifecycle events kept in the journal (0 disables the journal)
    pub journal_capacity: usize,

    /// Broadcast channel buffer for event subscribers
    pub event_capacity: usize,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self {
            auto_contain_threshold: ThreatLevel::High,
            max_quarantine_duration_ms: None,
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ContainmentConfig {
    /// Create a configuration with the given threshold and defaults elsewhere
    pub fn new(auto_contain_threshold: ThreatLevel) -> Self {
        Self {
            auto_contain_threshold,
            ..Self::default()
        }
    }

    /// Set the advisory maximum quarantine duration
    pub fn with_max_quarantine_duration_ms(mut self, duration_ms: u64) -> Self {
        self.max_quarantine_duration_ms = Some(duration_ms);
        self
    }

    /// Set the journal capacity
    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity;
        self
    }

    /// Parse a configuration from JSON, then validate it
    ///
    /// An integer `autoContainThreshold` outside 1..=4 fails with
    /// `ContainmentError::InvalidThreatLevel` rather than a serde error.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(level) = value.get("autoContainThreshold").and_then(|v| v.as_i64()) {
            ThreatLevel::try_from(level)?;
        }
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the registry cannot work with
    ///
    /// The threshold is range-checked by `ThreatLevel` itself, so only the
    /// remaining fields need validation here.
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(ContainmentError::Config(
                "eventCapacity must be greater than 0".to_string(),
            ));
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(ContainmentError::Config(format!(
                "eventCapacity {} exceeds the maximum of {}",
                self.event_capacity, MAX_EVENT_CAPACITY
            )));
        }
        if self.max_quarantine_duration_ms == Some(0) {
            return Err(ContainmentError::Config(
                "maxQuarantineDurationMs must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}
