mod common;

use std::sync::Arc;

use common::{attendee, empty_services, event_with_capacity};
use events::contract::model::{EventPatch, EventStatus};
use events::domain::error::DomainError;

#[tokio::test]
async fn capacity_two_scenario() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 2).await.event;

    let a = svc.ledger.enroll(ev.id, attendee("Ana", "a@x.com")).await.unwrap();
    svc.ledger.enroll(ev.id, attendee("Beto", "b@x.com")).await.unwrap();

    let c = svc.ledger.enroll(ev.id, attendee("Carla", "c@x.com")).await;
    assert!(matches!(c, Err(DomainError::CapacityExceeded { .. })));

    svc.ledger.delete(a.id).await.unwrap();
    assert_eq!(svc.ledger.compute_occupancy(ev.id).await.unwrap(), 1);

    svc.ledger.enroll(ev.id, attendee("Carla", "c@x.com")).await.unwrap();
    assert_eq!(svc.ledger.compute_occupancy(ev.id).await.unwrap(), 2);
}

#[tokio::test]
async fn duplicate_email_any_casing() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 10).await.event;

    let first = svc.ledger.enroll(ev.id, attendee("Ana", "A@x.com")).await.unwrap();
    assert_eq!(first.attendee.email, "a@x.com");

    for email in ["A@x.com", "A@X.com", "a@x.com"] {
        let res = svc.ledger.enroll(ev.id, attendee("Ana", email)).await;
        assert!(
            matches!(res, Err(DomainError::DuplicateRegistration { .. })),
            "{email}"
        );
    }
}

#[tokio::test]
async fn missing_or_inactive_event_is_unavailable() {
    let svc = empty_services().await;
    let res = svc.ledger.enroll(99, attendee("Ana", "a@x.com")).await;
    assert!(matches!(res, Err(DomainError::EventUnavailable { id: 99 })));

    let ev = event_with_capacity(&svc, 5).await.event;
    svc.catalog
        .update_event(
            ev.id,
            EventPatch {
                status: Some(EventStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let res = svc.ledger.enroll(ev.id, attendee("Ana", "a@x.com")).await;
    assert!(matches!(res, Err(DomainError::EventUnavailable { .. })));
}

#[tokio::test]
async fn validation_runs_before_lookup() {
    let svc = empty_services().await;
    let mut bad = attendee("A", "not-an-email");
    bad.phone = "12345".into();
    let res = svc.ledger.enroll(99, bad).await;
    match res {
        Err(DomainError::Validation { violations }) => {
            let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
            assert_eq!(fields, ["nombre", "email", "telefono"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn update_keeps_id_and_refreshes_snapshot() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 5).await.event;
    let reg = svc.ledger.enroll(ev.id, attendee("Ana", "a@x.com")).await.unwrap();

    let updated = svc
        .ledger
        .update(reg.id, attendee("Ana María", "a@x.com"), ev.id)
        .await
        .unwrap();
    assert_eq!(updated.id, reg.id);
    assert_eq!(updated.attendee.name, "Ana María");
    assert_eq!(updated.created_at, reg.created_at);
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn update_into_taken_email_is_duplicate() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 5).await.event;
    svc.ledger.enroll(ev.id, attendee("Ana", "a@x.com")).await.unwrap();
    let beto = svc.ledger.enroll(ev.id, attendee("Beto", "b@x.com")).await.unwrap();

    let res = svc
        .ledger
        .update(beto.id, attendee("Beto", "A@X.COM"), ev.id)
        .await;
    assert!(matches!(res, Err(DomainError::DuplicateRegistration { .. })));
}

#[tokio::test]
async fn moving_to_a_full_event_is_rejected() {
    let svc = empty_services().await;
    let small = event_with_capacity(&svc, 1).await.event;
    let big = event_with_capacity(&svc, 5).await.event;

    let ana = svc.ledger.enroll(small.id, attendee("Ana", "a@x.com")).await.unwrap();
    let beto = svc.ledger.enroll(big.id, attendee("Beto", "b@x.com")).await.unwrap();

    let res = svc
        .ledger
        .update(beto.id, attendee("Beto", "b@x.com"), small.id)
        .await;
    assert!(matches!(res, Err(DomainError::CapacityExceeded { .. })));
    assert_eq!(svc.ledger.compute_occupancy(small.id).await.unwrap(), 1);

    svc.ledger
        .update(ana.id, attendee("Ana", "a@x.com"), big.id)
        .await
        .unwrap();
    let moved = svc
        .ledger
        .update(beto.id, attendee("Beto", "b@x.com"), small.id)
        .await
        .unwrap();
    assert_eq!(moved.event_id, small.id);
    assert_eq!(moved.event_name, small.name);
    assert_eq!(svc.ledger.compute_occupancy(big.id).await.unwrap(), 1);
}

#[tokio::test]
async fn update_and_delete_of_missing_registration() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 5).await.event;

    let res = svc.ledger.update(42, attendee("Ana", "a@x.com"), ev.id).await;
    assert!(matches!(res, Err(DomainError::RegistrationNotFound { id: 42 })));
    let res = svc.ledger.delete(42).await;
    assert!(matches!(res, Err(DomainError::RegistrationNotFound { id: 42 })));
}

#[tokio::test]
async fn list_by_attendee_newest_first_with_event() {
    let svc = empty_services().await;
    let ev1 = event_with_capacity(&svc, 5).await.event;
    let ev2 = event_with_capacity(&svc, 5).await.event;

    let r1 = svc.ledger.enroll(ev1.id, attendee("Ana", "a@x.com")).await.unwrap();
    let r2 = svc.ledger.enroll(ev2.id, attendee("Ana", "a@x.com")).await.unwrap();
    svc.ledger.enroll(ev2.id, attendee("Beto", "b@x.com")).await.unwrap();

    let found = svc.ledger.list_by_attendee("  A@X.com ").await.unwrap();
    let ids: Vec<u64> = found.iter().map(|r| r.registration.id).collect();
    assert_eq!(ids, vec![r2.id, r1.id]);
    assert_eq!(found[0].event.as_ref().map(|e| e.id), Some(ev2.id));

    let blank = svc.ledger.list_by_attendee("   ").await;
    assert!(matches!(blank, Err(DomainError::Validation { .. })));
}

#[tokio::test]
async fn capacity_cannot_drop_below_occupancy() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 3).await.event;
    svc.ledger.enroll(ev.id, attendee("Ana", "a@x.com")).await.unwrap();
    svc.ledger.enroll(ev.id, attendee("Beto", "b@x.com")).await.unwrap();

    let res = svc
        .catalog
        .update_event(
            ev.id,
            EventPatch {
                capacity: Some(1),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        res,
        Err(DomainError::CapacityBelowOccupancy { occupancy: 2, .. })
    ));

    let view = svc
        .catalog
        .update_event(
            ev.id,
            EventPatch {
                capacity: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!view.is_available);
}

#[tokio::test]
async fn concurrent_enrolls_never_exceed_capacity() {
    const CAPACITY: usize = 7;
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, CAPACITY as i64).await.event;

    let mut tasks = Vec::new();
    for i in 0..=CAPACITY {
        let svc = Arc::clone(&svc);
        tasks.push(tokio::spawn(async move {
            svc.ledger
                .enroll(ev.id, attendee("Asistente", &format!("p{i}@x.com")))
                .await
        }));
    }

    let mut ok = 0;
    let mut full = 0;
    for t in tasks {
        match t.await.unwrap() {
            Ok(_) => ok += 1,
            Err(DomainError::CapacityExceeded { .. }) => full += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, CAPACITY);
    assert_eq!(full, 1);
    assert_eq!(svc.ledger.compute_occupancy(ev.id).await.unwrap(), CAPACITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_email_yields_one_registration() {
    let svc = empty_services().await;
    let ev = event_with_capacity(&svc, 50).await.event;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let svc = Arc::clone(&svc);
        tasks.push(tokio::spawn(async move {
            svc.ledger.enroll(ev.id, attendee("Ana", "a@x.com")).await
        }));
    }
    let mut ok = 0;
    for t in tasks {
        if t.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crossing_moves_complete() {
    let svc = empty_services().await;
    let a = event_with_capacity(&svc, 100).await.event;
    let b = event_with_capacity(&svc, 100).await.event;

    let mut regs = Vec::new();
    for i in 0..20 {
        let ev = if i % 2 == 0 { a.id } else { b.id };
        let r = svc
            .ledger
            .enroll(ev, attendee("Asistente", &format!("m{i}@x.com")))
            .await
            .unwrap();
        regs.push(r);
    }

    let mut tasks = Vec::new();
    for r in regs {
        let svc = Arc::clone(&svc);
        let target = if r.event_id == a.id { b.id } else { a.id };
        tasks.push(tokio::spawn(async move {
            svc.ledger
                .update(r.id, r.attendee.clone(), target)
                .await
        }));
    }
    tokio::time::timeout(std::time::Duration::from_secs(10), async {
        for t in tasks {
            t.await.unwrap().unwrap();
        }
    })
    .await
    .expect("moves deadlocked");

    assert_eq!(svc.ledger.compute_occupancy(a.id).await.unwrap(), 10);
    assert_eq!(svc.ledger.compute_occupancy(b.id).await.unwrap(), 10);
}
