//! # a3s-containment
//!
//! Session quarantine bookkeeping for the A3S threat-response pipeline.
//!
//! ## Overview
//!
//! `a3s-containment` tracks which sessions are currently quarantined because
//! of a detected threat, and keeps the record of each quarantine until it is
//! released and aged out. Callers decide when a threat is detected and how
//! severe it is; the registry only records containment state and answers
//! queries about it. Enforcing the isolation is up to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_containment::{ContainmentConfig, ContainmentRegistry, ThreatLevel};
//!
//! # fn example() -> a3s_containment::Result<()> {
//! let registry = ContainmentRegistry::new(ContainmentConfig::new(ThreatLevel::High))?;
//!
//! if registry.should_auto_contain(ThreatLevel::Critical) {
//!     registry.quarantine("session-42", "credential exfiltration");
//! }
//! assert!(registry.is_quarantined("session-42"));
//!
//! registry.release("session-42");
//! let stats = registry.get_stats();
//! assert_eq!(stats.released, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **ContainmentRegistry** — one record per session, quarantine/release/cleanup
//! - **ContainmentJournal** — bounded lifecycle log that survives record replacement
//! - **Clock** trait — time source, swappable for `ManualClock` in tests
//! - **QuarantineRecord** — serializable record of one quarantine lifecycle

pub mod clock;
pub mod config;
pub mod error;
pub mod journal;
pub mod registry;
pub mod types;

// Re-export core types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ContainmentConfig;
pub use error::{ContainmentError, Result};
pub use journal::{ContainmentEvent, ContainmentEventKind, ContainmentJournal};
pub use registry::{ContainmentRegistry, DEFAULT_RETENTION_MS};
pub use types::{ContainmentStats, QuarantineRecord, ThreatLevel};
