//! Containment registry integration tests
//!
//! End-to-end tests exercising the public registry API with the real
//! system clock. Covers the quarantine/release lifecycle, stats, retention,
//! journal, subscriptions, and concurrency.

use a3s_containment::{
    ContainmentConfig, ContainmentEventKind, ContainmentRegistry, ContainmentStats,
    QuarantineRecord, ThreatLevel,
};
use std::sync::Arc;
use std::time::Duration;

fn test_registry() -> ContainmentRegistry {
    ContainmentRegistry::new(ContainmentConfig::new(ThreatLevel::High)).unwrap()
}

// ─── Lifecycle ───────────────────────────────────────────────────

#[test]
fn test_quarantine_release_lifecycle() {
    let registry = test_registry();

    assert!(registry.quarantine("A", "lateral movement"));
    assert!(registry.is_quarantined("A"));
    assert!(!registry.quarantine("A", "duplicate"));

    assert!(registry.release("A"));
    assert!(!registry.is_quarantined("A"));

    let record = registry.get_record("A").unwrap();
    assert!(record.released);
    assert!(record.released_at.unwrap() >= record.created_at);
    assert_eq!(record.reason, "lateral movement");
    assert_eq!(record.threat_level, ThreatLevel::High);
}

#[test]
fn test_unknown_session() {
    let registry = test_registry();
    assert!(!registry.release("nobody"));
    assert!(!registry.is_quarantined("nobody"));
    assert!(registry.get_record("nobody").is_none());
}

#[test]
fn test_stats_empty_registry() {
    let registry = test_registry();
    let stats = registry.get_stats();
    assert_eq!(stats, ContainmentStats::default());
    assert_eq!(stats.total_quarantined, 0);
    assert_eq!(stats.currently_quarantined, 0);
    assert_eq!(stats.released, 0);
    assert_eq!(stats.average_quarantine_time, 0.0);
}

#[test]
fn test_stats_with_measured_delay() {
    let registry = test_registry();
    registry.quarantine("A", "threat");
    registry.quarantine("B", "threat");

    let delay = Duration::from_millis(50);
    std::thread::sleep(delay);
    registry.release("A");

    let stats = registry.get_stats();
    assert_eq!(stats.total_quarantined, 2);
    assert_eq!(stats.currently_quarantined, 1);
    assert_eq!(stats.released, 1);
    assert!(stats.average_quarantine_time >= 50.0);
    assert!(stats.average_quarantine_time < 1_000.0);
}

#[test]
fn test_clear_old_records_zero_window() {
    let registry = test_registry();
    registry.quarantine("active", "x");
    registry.quarantine("done-1", "x");
    registry.quarantine("done-2", "x");
    registry.release("done-1");
    registry.release("done-2");

    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(registry.clear_old_records(0), 2);

    let history = registry.get_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].session_id, "active");
    assert!(registry.is_quarantined("active"));
}

#[test]
fn test_clear_old_records_default_keeps_recent() {
    let registry = test_registry();
    registry.quarantine("s1", "x");
    registry.release("s1");
    assert_eq!(registry.clear_old_records_default(), 0);
    assert!(registry.get_record("s1").is_some());
}

#[test]
fn test_history_snapshot_is_stable() {
    let registry = test_registry();
    registry.quarantine("a", "x");
    registry.quarantine("b", "y");
    registry.release("b");

    let sorted = |mut records: Vec<QuarantineRecord>| {
        records.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        records
    };
    assert_eq!(sorted(registry.get_history()), sorted(registry.get_history()));
}

#[test]
fn test_auto_contain_drives_quarantine() {
    let registry = test_registry();
    let detections = [
        ("s-low", ThreatLevel::Low),
        ("s-medium", ThreatLevel::Medium),
        ("s-high", ThreatLevel::High),
        ("s-critical", ThreatLevel::Critical),
    ];

    for (session, level) in detections {
        if registry.should_auto_contain(level) {
            registry.quarantine_with_level(session, "auto-contained", level);
        }
    }

    let mut contained: Vec<String> = registry
        .get_quarantined_sessions()
        .into_iter()
        .map(|r| r.session_id)
        .collect();
    contained.sort();
    assert_eq!(contained, vec!["s-critical", "s-high"]);
    assert_eq!(
        registry.get_record("s-critical").unwrap().threat_level,
        ThreatLevel::Critical
    );
}

// ─── Journal & Events ────────────────────────────────────────────

#[test]
fn test_journal_preserves_replaced_lifecycles() {
    let registry = test_registry();
    registry.quarantine("s1", "first incident");
    registry.release("s1");
    registry.quarantine("s1", "second incident");

    // The snapshot only has the latest lifecycle
    assert_eq!(registry.get_history().len(), 1);

    let reasons: Vec<String> = registry
        .journal_for_session("s1")
        .into_iter()
        .filter(|e| e.kind == ContainmentEventKind::Quarantined)
        .map(|e| e.reason)
        .collect();
    assert_eq!(reasons, vec!["first incident", "second incident"]);
}

#[test]
fn test_journal_capacity_from_config() {
    let config = ContainmentConfig::new(ThreatLevel::High).with_journal_capacity(2);
    let registry = ContainmentRegistry::new(config).unwrap();
    for i in 0..5 {
        registry.quarantine(&format!("s{}", i), "x");
    }
    let recent = registry.journal(10);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].session_id, "s4");
}

#[tokio::test]
async fn test_subscriber_sees_purge() {
    let registry = Arc::new(test_registry());
    let mut rx = registry.subscribe();

    registry.quarantine("s1", "x");
    registry.release("s1");
    tokio::time::sleep(Duration::from_millis(5)).await;
    registry.clear_old_records(0);

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        kinds.push(event.kind);
    }
    assert_eq!(
        kinds,
        vec![
            ContainmentEventKind::Quarantined,
            ContainmentEventKind::Released,
            ContainmentEventKind::Purged,
        ]
    );
}

// ─── Config ──────────────────────────────────────────────────────

#[test]
fn test_registry_from_json_config() {
    let config = ContainmentConfig::from_json(
        r#"{"autoContainThreshold": 2, "maxQuarantineDurationMs": 3600000}"#,
    )
    .unwrap();
    let registry = ContainmentRegistry::new(config).unwrap();
    assert!(registry.should_auto_contain(ThreatLevel::Medium));
    assert!(!registry.should_auto_contain(ThreatLevel::Low));
    assert_eq!(registry.config().max_quarantine_duration_ms, Some(3_600_000));
}

#[test]
fn test_record_json_shape() {
    let registry = test_registry();
    registry.quarantine("sess-1", "c2 beacon");
    registry.release("sess-1");

    let json = serde_json::to_value(registry.get_record("sess-1").unwrap()).unwrap();
    assert_eq!(json["sessionId"], "sess-1");
    assert_eq!(json["reason"], "c2 beacon");
    assert_eq!(json["released"], true);
    assert_eq!(json["threatLevel"], 3);
    assert!(json["timestamp"].is_string());
    assert!(json["releasedAt"].is_string());
}

// ─── Concurrency ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_quarantine_same_session() {
    let registry = Arc::new(test_registry());
    let mut handles = Vec::new();

    for i in 0..50 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry.quarantine("contested", &format!("task {}", i))
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.journal(100).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_sessions() {
    let registry = Arc::new(test_registry());
    let mut handles = Vec::new();

    for i in 0..50 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            let session = format!("s{}", i);
            assert!(registry.quarantine(&session, "burst"));
            if i % 2 == 0 {
                assert!(registry.release(&session));
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = registry.get_stats();
    assert_eq!(stats.total_quarantined, 50);
    assert_eq!(stats.released, 25);
    assert_eq!(stats.currently_quarantined, 25);
}
