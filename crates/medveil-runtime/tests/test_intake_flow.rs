//! End-to-end intake flow: contact lookup → redact → reason → restore,
//! with the audit trail queryable afterwards.
//!
//! Run with: cargo test --package medveil-runtime --test test_intake_flow

use std::sync::Arc;

use medveil_audit::AuditLog;
use medveil_common::SessionId;
use medveil_llm::MockBackend;
use medveil_phi::{partial_restore, redact_with_known, PatientProfile, PhiCategory};
use medveil_runtime::{ReasoningContext, ReasoningPipeline};
use tempfile::tempdir;

#[tokio::test]
async fn test_full_intake_round_trip() {
    let dir = tempdir().unwrap();
    let audit = Arc::new(AuditLog::open(dir.path()).unwrap());
    let pipeline = ReasoningPipeline::new(
        Arc::new(MockBackend::new()),
        Arc::clone(&audit),
        ReasoningContext::Chat,
    );

    let profile = PatientProfile {
        name: Some("John Smith".to_string()),
        phone: Some("555-123-4567".to_string()),
        rx_number: Some("RX1234567".to_string()),
        ..Default::default()
    };
    let session = SessionId::from_external("chat-thread-42");
    let input = "Hi, this is John Smith, checking on RX1234567. \
                 Call me back at 555-123-4567 or email john@smith.net";

    let outcome = pipeline
        .process(&session, input, Some(&profile), None)
        .await
        .unwrap();

    // Echo backend: final response equals the original input.
    assert_eq!(outcome.response, input);

    // Nothing identifying reached the backend.
    for phi in ["John Smith", "RX1234567", "555-123-4567", "john@smith.net"] {
        assert!(
            !outcome.deidentified_input.contains(phi),
            "leaked {phi:?} in {:?}",
            outcome.deidentified_input
        );
    }

    // The session's audit subsequence covers every step, in write order.
    let entries = audit.entries_for_session(session.as_str()).unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions.first(), Some(&"deidentify"));
    assert_eq!(actions.last(), Some(&"reidentify"));
    assert!(actions.contains(&"ai_call"));
    let phi_accesses: Vec<&str> = entries
        .iter()
        .filter(|e| e.action.starts_with("phi_"))
        .filter_map(|e| e.details.as_deref())
        .collect();
    assert!(phi_accesses.contains(&"category=NAME"));
    assert!(phi_accesses.contains(&"category=PHONE"));
    assert!(phi_accesses.contains(&"category=RX"));

    // Same entries are visible through the date index.
    let today = chrono::Utc::now().date_naive();
    let by_date = audit.entries_for_date(today).unwrap();
    assert!(by_date.len() >= entries.len());
}

#[test]
fn test_analytics_view_keeps_contact_details_masked() {
    // An analytics consumer may see who a conversation was about, but
    // never how to reach them.
    let profile = PatientProfile {
        name: Some("John Smith".to_string()),
        phone: Some("555-123-4567".to_string()),
        ..Default::default()
    };
    let redaction = redact_with_known(
        "John Smith asked us to call 555-123-4567",
        &profile.known_values(),
    );

    let analytics_view = partial_restore(
        &redaction.text,
        &redaction.token_map,
        &[PhiCategory::name()],
    );
    assert_eq!(analytics_view, "John Smith asked us to call [PHONE_1]");
}
