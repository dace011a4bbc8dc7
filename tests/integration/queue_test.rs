// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    build_scraper, collect_until_emptied, identifier_of, register_simple_set, FailingSink,
    PanickingSink, StubEngine,
};
use brickcrawl::domain::models::catalog::Revision;
use brickcrawl::infrastructure::storage::InMemorySink;
use brickcrawl::workers::events::QueueEvent;
use brickcrawl::workers::ScrapeQueue;
use std::sync::Arc;
use std::time::Duration;

fn queue_with(engine: Arc<StubEngine>, sink: Arc<InMemorySink>) -> ScrapeQueue {
    ScrapeQueue::new(Arc::new(build_scraper(engine)), sink)
}

fn started_order(events: &[QueueEvent]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for event in events {
        if let QueueEvent::JobStarted { identifier, .. } = event {
            if order.last() != Some(identifier) {
                order.push(identifier.clone());
            }
        }
    }
    order
}

#[tokio::test]
async fn test_jobs_run_in_fifo_order() {
    let engine = Arc::new(StubEngine::new());
    for id in ["10497-1", "21061-1", "75192-1"] {
        register_simple_set(&engine, id, id);
    }
    let sink = Arc::new(InMemorySink::new());
    let queue = queue_with(engine, sink.clone());
    let mut rx = queue.events().subscribe_channel();

    queue.enqueue("10497-1", 1, Revision::LATEST);
    queue.enqueue("21061-1", 1, Revision::LATEST);
    queue.enqueue("75192-1", 1, Revision::LATEST);

    let events = collect_until_emptied(&mut rx).await;
    assert_eq!(started_order(&events), vec!["10497-1", "21061-1", "75192-1"]);

    let completed: Vec<&str> = events
        .iter()
        .filter(|e| matches!(e, QueueEvent::JobCompleted { .. }))
        .filter_map(identifier_of)
        .collect();
    assert_eq!(completed, vec!["10497-1", "21061-1", "75192-1"]);
    assert_eq!(sink.entities().len(), 3);
}

#[tokio::test]
async fn test_per_job_notifications_are_ordered() {
    let engine = Arc::new(StubEngine::new());
    register_simple_set(&engine, "10497-1", "Galaxy Explorer");
    let queue = queue_with(engine, Arc::new(InMemorySink::new()));
    let mut rx = queue.events().subscribe_channel();

    queue.enqueue("10497-1", 1, Revision::LATEST);
    let events = collect_until_emptied(&mut rx).await;

    let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec!["worker_started", "started", "started", "completed", "queue_emptied"]
    );

    match &events[1] {
        QueueEvent::JobStarted { status, .. } => assert_eq!(status, "Fetching catalog data..."),
        other => panic!("unexpected event {:?}", other),
    }
    match &events[2] {
        QueueEvent::JobStarted { status, .. } => assert_eq!(status, "Saving to storage..."),
        other => panic!("unexpected event {:?}", other),
    }
    match &events[3] {
        QueueEvent::JobCompleted {
            display_name,
            component_count,
            status,
            ..
        } => {
            assert_eq!(display_name, "Galaxy Explorer");
            assert_eq!(*component_count, 1);
            assert_eq!(status, "Successfully added 1 parts");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_worker_starts_once_for_rapid_enqueues() {
    let engine = Arc::new(StubEngine::new());
    register_simple_set(&engine, "10497-1", "Galaxy Explorer");
    let queue = queue_with(engine, Arc::new(InMemorySink::new()));
    let mut rx = queue.events().subscribe_channel();

    for _ in 0..5 {
        queue.enqueue("10497-1", 1, Revision::LATEST);
    }
    assert!(queue.is_processing());

    let events = collect_until_emptied(&mut rx).await;
    let starts = events
        .iter()
        .filter(|e| matches!(e, QueueEvent::WorkerStarted))
        .count();
    let completed = events
        .iter()
        .filter(|e| matches!(e, QueueEvent::JobCompleted { .. }))
        .count();
    assert_eq!(starts, 1);
    assert_eq!(completed, 5);
    assert!(!queue.is_processing());
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_failure_does_not_stop_the_queue() {
    let engine = Arc::new(StubEngine::new());
    // 404 for the item page of the first set
    register_simple_set(&engine, "21061-1", "Notre-Dame de Paris");
    let queue = queue_with(engine, Arc::new(InMemorySink::new()));
    let mut rx = queue.events().subscribe_channel();

    queue.enqueue("0000-1", 1, Revision::LATEST);
    queue.enqueue("21061-1", 1, Revision::LATEST);

    let events = collect_until_emptied(&mut rx).await;

    let failed = events.iter().find_map(|e| match e {
        QueueEvent::JobFailed { identifier, status } => Some((identifier.clone(), status.clone())),
        _ => None,
    });
    let (identifier, status) = failed.expect("failed notification");
    assert_eq!(identifier, "0000-1");
    assert!(status.starts_with("Error: Error scraping set 0000-1"), "{}", status);
    assert!(status.contains("404"), "{}", status);

    assert!(events
        .iter()
        .any(|e| matches!(e, QueueEvent::JobCompleted { identifier, .. } if identifier == "21061-1")));
}

#[tokio::test]
async fn test_persistence_failure_is_reported() {
    let engine = Arc::new(StubEngine::new());
    register_simple_set(&engine, "10497-1", "Galaxy Explorer");
    let queue = ScrapeQueue::new(Arc::new(build_scraper(engine)), Arc::new(FailingSink));
    let mut rx = queue.events().subscribe_channel();

    queue.enqueue("10497-1", 1, Revision::LATEST);
    let events = collect_until_emptied(&mut rx).await;

    assert!(events.iter().any(|e| matches!(
        e,
        QueueEvent::JobFailed { status, .. } if status == "Error: Failed to persist result: Sink error: disk full"
    )));
    assert!(!events
        .iter()
        .any(|e| matches!(e, QueueEvent::JobCompleted { .. })));
}

#[tokio::test]
async fn test_cancel_stops_between_jobs_and_resumes_on_enqueue() {
    let engine = Arc::new(StubEngine::with_latency(Duration::from_millis(20)));
    for id in ["10497-1", "21061-1", "75192-1", "42115-1"] {
        register_simple_set(&engine, id, id);
    }
    let sink = Arc::new(InMemorySink::new());
    let queue = queue_with(engine, sink.clone());
    let mut rx = queue.events().subscribe_channel();

    queue.enqueue("10497-1", 1, Revision::LATEST);
    queue.enqueue("21061-1", 1, Revision::LATEST);
    queue.enqueue("75192-1", 1, Revision::LATEST);

    // Cancel while the first job is in flight
    loop {
        let event = rx.recv().await.expect("event");
        if matches!(event, QueueEvent::JobStarted { .. }) {
            break;
        }
    }
    queue.cancel();

    let events = collect_until_emptied(&mut rx).await;
    assert!(events
        .iter()
        .any(|e| matches!(e, QueueEvent::JobCompleted { identifier, .. } if identifier == "10497-1")));
    assert!(!events
        .iter()
        .any(|e| matches!(e, QueueEvent::JobStarted { identifier, .. } if identifier != "10497-1")));
    assert_eq!(queue.len(), 2);
    assert!(!queue.is_processing());

    queue.enqueue("42115-1", 1, Revision::LATEST);
    let events = collect_until_emptied(&mut rx).await;
    assert_eq!(started_order(&events), vec!["21061-1", "75192-1", "42115-1"]);
    assert_eq!(sink.entities().len(), 4);
}

#[tokio::test]
async fn test_listener_callbacks_see_events() {
    let engine = Arc::new(StubEngine::new());
    register_simple_set(&engine, "10497-1", "Galaxy Explorer");
    let queue = queue_with(engine, Arc::new(InMemorySink::new()));

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let recorder = seen.clone();
    queue
        .events()
        .subscribe(move |event| recorder.lock().push(event.name()));
    let mut rx = queue.events().subscribe_channel();

    queue.enqueue("10497-1", 1, Revision::LATEST);
    collect_until_emptied(&mut rx).await;

    assert_eq!(seen.lock().first().copied(), Some("worker_started"));
    assert_eq!(seen.lock().last().copied(), Some("queue_emptied"));
}

#[tokio::test]
async fn test_panicking_job_fails_alone_and_queue_recovers() {
    let engine = Arc::new(StubEngine::new());
    register_simple_set(&engine, "boom-1", "Exploding Set");
    register_simple_set(&engine, "10497-1", "Galaxy Explorer");
    let sink = Arc::new(PanickingSink {
        target: "boom-1",
        inner: InMemorySink::new(),
    });
    let queue = ScrapeQueue::new(Arc::new(build_scraper(engine)), sink.clone());
    let mut rx = queue.events().subscribe_channel();

    queue.enqueue("boom-1", 1, Revision::LATEST);
    queue.enqueue("10497-1", 1, Revision::LATEST);
    let events = collect_until_emptied(&mut rx).await;

    assert!(events.iter().any(|e| matches!(
        e,
        QueueEvent::JobFailed { identifier, status } if identifier == "boom-1" && status == "Error: job panicked"
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, QueueEvent::JobCompleted { identifier, .. } if identifier == "10497-1")));
    assert!(!queue.is_processing());
    assert!(queue.is_empty());

    // The next enqueue starts a fresh worker
    queue.enqueue("10497-1", 3, Revision::LATEST);
    let events = collect_until_emptied(&mut rx).await;
    assert!(matches!(events.first(), Some(QueueEvent::WorkerStarted)));
    assert!(events
        .iter()
        .any(|e| matches!(e, QueueEvent::JobCompleted { .. })));
    assert_eq!(sink.inner.entity("10497-1").map(|e| e.quantity), Some(3));
    assert!(sink.inner.entity("boom-1").is_none());
}

#[tokio::test]
async fn test_queue_is_idle_when_emptied_is_published() {
    let engine = Arc::new(StubEngine::new());
    register_simple_set(&engine, "10497-1", "Galaxy Explorer");
    let queue = queue_with(engine, Arc::new(InMemorySink::new()));

    let observed = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let watched = queue.clone();
    let recorder = observed.clone();
    queue.events().subscribe(move |event| {
        if matches!(event, QueueEvent::QueueEmptied) {
            recorder.lock().push(watched.is_processing());
        }
    });
    let mut rx = queue.events().subscribe_channel();

    queue.enqueue("10497-1", 1, Revision::LATEST);
    collect_until_emptied(&mut rx).await;

    assert_eq!(*observed.lock(), vec![false]);
}
