//! Integration tests for the relay path: capture pump → relay processor →
//! event bus → CAS mark-sent, over the in-memory stack.
//!
//! Covers the end-to-end scenario, idempotent terminal state, concurrent
//! duplicate delivery and per-item failure isolation.

use person_domain::outbox::{OutboxRepository, OutboxStatus};
use person_domain::person::NewPerson;

mod common;

use common::{TestStack, deadline};

fn alexandre() -> NewPerson {
    NewPerson {
        first_name: Some("Alexandre".to_string()),
        last_name: Some("Borges".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn end_to_end_create_then_relay() {
    let stack = TestStack::new();

    let person = stack
        .create_person
        .execute(alexandre(), deadline())
        .await
        .unwrap();

    let pump = stack.pump();
    let result = pump.poll_once().await.unwrap();
    assert!(result.all_succeeded());

    // Published entry carries the event type, the fixed source, the stored
    // payload and the aggregate id as a resource reference.
    let published = stack.bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].detail_type, "PersonCreated");
    assert_eq!(published[0].source, "person.service");
    assert_eq!(published[0].resources, vec![person.id.as_str().to_string()]);

    let detail: serde_json::Value = serde_json::from_str(&published[0].detail_json).unwrap();
    assert_eq!(detail["firstName"], "Alexandre");
    assert_eq!(detail["lastName"], "Borges");

    let record = stack.outbox_record_for(person.id.as_str()).await.unwrap();
    assert_eq!(record.status, OutboxStatus::Sent);
    assert_eq!(record.attempts, 1);
    assert!(record.sent_at.is_some());
}

#[tokio::test]
async fn redelivered_sent_record_is_a_noop() {
    let stack = TestStack::new();

    let person = stack
        .create_person
        .execute(alexandre(), deadline())
        .await
        .unwrap();

    stack.pump().poll_once().await.unwrap();
    let after_first = stack.outbox_record_for(person.id.as_str()).await.unwrap();

    // A fresh pump has empty acknowledgment state, like a restarted
    // consumer: it redelivers the already-SENT record.
    let restarted = stack.pump();
    let result = restarted.poll_once().await.unwrap();

    assert!(result.all_succeeded());
    // No new publish and no store mutation.
    assert_eq!(stack.bus.published_count(), 1);
    let after_second = stack.outbox_record_for(person.id.as_str()).await.unwrap();
    assert_eq!(after_second, after_first);
    assert_eq!(after_second.attempts, 1);
}

#[tokio::test]
async fn concurrent_duplicate_delivery_marks_sent_exactly_once() {
    let stack = TestStack::new();

    let person = stack
        .create_person
        .execute(alexandre(), deadline())
        .await
        .unwrap();

    // Two racing deliveries of the same PENDING snapshot.
    let batch = stack.capture_batch().await;
    let (first, second) = tokio::join!(
        stack.processor.process_batch(batch.clone(), deadline()),
        stack.processor.process_batch(batch, deadline()),
    );

    // Neither invocation reports a failure: the loser of the CAS race
    // treats the already-sent record as success.
    assert!(first.all_succeeded());
    assert!(second.all_succeeded());

    // Both saw PENDING, so both published; duplicates are tolerated by
    // design. The bookkeeping is exact regardless.
    assert_eq!(stack.bus.published_count(), 2);

    let record = stack.outbox_record_for(person.id.as_str()).await.unwrap();
    assert_eq!(record.status, OutboxStatus::Sent);
    assert_eq!(record.attempts, 1);
}

#[tokio::test]
async fn failure_isolation_within_a_batch() {
    let stack = TestStack::new();

    let mut ids = Vec::new();
    for first_name in ["Alexandre", "Maria", "Joao"] {
        let person = stack
            .create_person
            .execute(
                NewPerson {
                    first_name: Some(first_name.to_string()),
                    ..Default::default()
                },
                deadline(),
            )
            .await
            .unwrap();
        ids.push(person.id.as_str().to_string());
    }

    // Make only the second person's publish fail.
    stack.bus.reject_resource(&ids[1]);

    let pump = stack.pump();
    let result = pump.poll_once().await.unwrap();

    let failed_record = stack.outbox_record_for(&ids[1]).await.unwrap();
    assert_eq!(
        result.failed_item_ids,
        vec![failed_record.id.as_str().to_string()]
    );

    // The other two items completed independently of batch order.
    for id in [&ids[0], &ids[2]] {
        let record = stack.outbox_record_for(id).await.unwrap();
        assert_eq!(record.status, OutboxStatus::Sent);
        assert_eq!(record.attempts, 1);
    }
    assert_eq!(failed_record.status, OutboxStatus::Pending);
    assert_eq!(failed_record.attempts, 0);

    // Redelivery is scoped to exactly the failed item.
    stack.bus.clear_rejections();
    let retry = pump.poll_once().await.unwrap();
    assert!(retry.all_succeeded());

    let retried = stack
        .outbox
        .find_by_id(failed_record.id.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(retried.status, OutboxStatus::Sent);
    assert_eq!(retried.attempts, 1);
    // 2 accepted on the first poll + 1 on the retry.
    assert_eq!(stack.bus.published_count(), 3);
}

#[tokio::test]
async fn transport_failure_defers_the_whole_batch() {
    let stack = TestStack::new();

    for first_name in ["Alexandre", "Maria"] {
        stack
            .create_person
            .execute(
                NewPerson {
                    first_name: Some(first_name.to_string()),
                    ..Default::default()
                },
                deadline(),
            )
            .await
            .unwrap();
    }

    stack.bus.fail_transport(true);
    let pump = stack.pump();
    let result = pump.poll_once().await.unwrap();
    assert_eq!(result.failed_item_ids.len(), 2);
    assert_eq!(stack.outbox.count_pending().await.unwrap(), 2);

    // Recovery retries the full publish+mark sequence for both items.
    stack.bus.fail_transport(false);
    let retry = pump.poll_once().await.unwrap();
    assert!(retry.all_succeeded());
    assert_eq!(stack.outbox.count_pending().await.unwrap(), 0);
    assert_eq!(stack.bus.published_count(), 2);
}

#[tokio::test]
async fn pump_acknowledges_processed_records() {
    let stack = TestStack::new();

    stack
        .create_person
        .execute(alexandre(), deadline())
        .await
        .unwrap();

    let pump = stack.pump();
    pump.poll_once().await.unwrap();
    assert_eq!(stack.bus.published_count(), 1);

    // Acknowledged records are not redelivered by the same pump instance.
    let result = pump.poll_once().await.unwrap();
    assert!(result.all_succeeded());
    assert_eq!(stack.bus.published_count(), 1);
}
