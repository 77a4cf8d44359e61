//! Spans emitted by the registration ledger.

mod common;

use common::{attendee, empty_services, event_with_capacity};
use tracing_test::traced_test;

#[traced_test]
#[tokio::test]
async fn enroll_span_records_stored_email() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 3).await.event;

    let reg = svc
        .ledger
        .enroll(ev.id, attendee("Ana", "Ana.Perez@X.com"))
        .await
        .unwrap();
    assert_eq!(reg.attendee.email, "ana.perez@x.com");

    assert!(logs_contain("events.ledger.enroll"));
    assert!(logs_contain("email=ana.perez@x.com"));
    assert!(!logs_contain("Ana.Perez@X.com"));
}

#[traced_test]
#[tokio::test]
async fn rejected_enroll_does_not_log_raw_email() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 3).await.event;

    let res = svc
        .ledger
        .enroll(ev.id, attendee("A", "Not-An-Email"))
        .await;
    assert!(res.is_err());
    assert!(!logs_contain("Not-An-Email"));
}
