/*!
 * End-to-end delivery behavior: a real client and worker wired to mock
 * transports, plus a capturing `tracing` subscriber so the log-side
 * contract (warning counts, severities) can be asserted.
 *
 * The subscriber is process-global, shared by every test in this binary;
 * each assertion therefore counts a message that only its own test can
 * produce.
 */

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use posthog_core::{
    CancellationSource, Client, Options, Transport, TransportError, TransportResponse,
};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Metadata, Subscriber};

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LogStore {
    entries: Mutex<Vec<(Level, String)>>,
}

impl LogStore {
    fn count(&self, level: Level, needle: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(entry_level, message)| *entry_level == level && message.contains(needle))
            .count()
    }
}

struct CapturingSubscriber {
    store: Arc<LogStore>,
    next_span_id: AtomicU64,
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl Subscriber for CapturingSubscriber {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _attributes: &Attributes<'_>) -> Id {
        Id::from_u64(self.next_span_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.store
                .entries
                .lock()
                .unwrap()
                .push((*event.metadata().level(), message));
        }
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

fn logs() -> Arc<LogStore> {
    static STORE: OnceLock<Arc<LogStore>> = OnceLock::new();
    STORE
        .get_or_init(|| {
            let store = Arc::new(LogStore::default());
            let subscriber = CapturingSubscriber {
                store: store.clone(),
                next_span_id: AtomicU64::new(0),
            };
            tracing::subscriber::set_global_default(subscriber)
                .expect("no other global subscriber in this test binary");
            store
        })
        .clone()
}

// ---------------------------------------------------------------------------
// Mock transport
// ---------------------------------------------------------------------------

/**
 * Records every POSTed body. Answers with scripted statuses front-first,
 * then 200. With a `gate`, each call blocks until the test releases it —
 * used to hold the worker mid-send deterministically.
 */
#[derive(Default)]
struct MockTransport {
    bodies: Arc<Mutex<Vec<String>>>,
    statuses: Mutex<VecDeque<u16>>,
    gate: Option<crossbeam_channel::Receiver<()>>,
}

impl Transport for MockTransport {
    fn post(&self, _endpoint: &str, body: &str) -> Result<TransportResponse, TransportError> {
        self.bodies.lock().unwrap().push(body.to_string());

        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }

        let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);
        Ok(TransportResponse {
            status,
            body: "mock response body".to_string(),
        })
    }
}

fn client_with(transport: MockTransport) -> Client {
    Client::with_options(
        "phc_test",
        Options {
            transport: Some(Box::new(transport)),
            ..Default::default()
        },
    )
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn wait_for_requests(bodies: &Arc<Mutex<Vec<String>>>, count: usize) -> Vec<serde_json::Value> {
    wait_until(|| bodies.lock().unwrap().len() >= count);
    bodies
        .lock()
        .unwrap()
        .iter()
        .map(|body| serde_json::from_str(body).unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn events_reach_the_transport_in_capture_order() {
    let transport = MockTransport::default();
    let bodies = transport.bodies.clone();
    let client = client_with(transport);

    for i in 0..10 {
        client.capture(&format!("event_{i}"), "user-1", None);
    }
    client.stop_processing(None);

    let sent = wait_for_requests(&bodies, 10);
    for (i, request) in sent.iter().enumerate() {
        assert_eq!(request["event"], format!("event_{i}"));
        assert_eq!(request["api_key"], "phc_test");
        assert_eq!(request["distinct_id"], "user-1");
    }
}

#[test]
fn captured_events_carry_a_timestamp_and_an_empty_properties_map() {
    let transport = MockTransport::default();
    let bodies = transport.bodies.clone();
    let client = client_with(transport);

    client.capture("bare", "user-9", None);
    client.stop_processing(None);

    let sent = wait_for_requests(&bodies, 1);
    assert_eq!(sent[0]["properties"], serde_json::json!({}));

    let raw = sent[0]["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(raw).is_ok());
}

#[test]
fn missing_api_key_disables_the_client_permanently() {
    let transport = MockTransport::default();
    let bodies = transport.bodies.clone();
    let client = client_with_key("", transport);

    assert!(!client.enabled());
    client.set_enabled(true);
    assert!(!client.enabled());

    for _ in 0..100 {
        client.capture("ignored", "user-1", None);
    }
    client.stop_processing(None);

    std::thread::sleep(Duration::from_millis(50));
    assert!(bodies.lock().unwrap().is_empty());
}

fn client_with_key(api_key: &str, transport: MockTransport) -> Client {
    Client::with_options(
        api_key,
        Options {
            transport: Some(Box::new(transport)),
            ..Default::default()
        },
    )
}

/**
 * Holds the worker inside its first send, queues more events, then flips
 * the kill-switch: everything dequeued afterwards must be discarded, and
 * the discard warning must appear exactly once.
 */
#[test]
fn disabling_mid_stream_discards_queued_events_with_a_single_warning() {
    let logs = logs();
    let (release, gate) = crossbeam_channel::bounded(0);
    let transport = MockTransport {
        gate: Some(gate),
        ..Default::default()
    };
    let bodies = transport.bodies.clone();
    let client = client_with(transport);

    client.capture("first", "user-1", None);
    wait_until(|| bodies.lock().unwrap().len() == 1);

    for i in 0..5 {
        client.capture(&format!("queued_{i}"), "user-1", None);
    }
    client.set_enabled(false);
    release.send(()).unwrap();

    client.stop_processing(None);

    assert_eq!(bodies.lock().unwrap().len(), 1);
    assert_eq!(logs.count(Level::WARN, "capture calls are disabled"), 1);
}

#[test]
fn unauthorized_responses_warn_and_do_not_stop_the_worker() {
    let logs = logs();
    let transport = MockTransport {
        statuses: Mutex::new(VecDeque::from([401])),
        ..Default::default()
    };
    let bodies = transport.bodies.clone();
    let client = client_with(transport);

    client.capture("rejected", "user-1", None);
    client.capture("delivered", "user-1", None);
    client.stop_processing(None);

    let sent = wait_for_requests(&bodies, 2);
    assert_eq!(sent[1]["event"], "delivered");
    assert_eq!(logs.count(Level::WARN, "api key is invalid"), 1);
}

#[test]
fn bad_request_responses_warn_with_the_rejection_hypothesis() {
    let logs = logs();
    let transport = MockTransport {
        statuses: Mutex::new(VecDeque::from([400])),
        ..Default::default()
    };
    let bodies = transport.bodies.clone();
    let client = client_with(transport);

    client.capture("malformed", "user-1", None);
    client.stop_processing(None);

    wait_for_requests(&bodies, 1);
    wait_until(|| logs.count(Level::WARN, "did not map to an active project") == 1);
}

#[test]
fn other_failure_statuses_warn_generically() {
    let logs = logs();
    let transport = MockTransport {
        statuses: Mutex::new(VecDeque::from([503])),
        ..Default::default()
    };
    let bodies = transport.bodies.clone();
    let client = client_with(transport);

    client.capture("unlucky", "user-1", None);
    client.stop_processing(None);

    wait_for_requests(&bodies, 1);
    wait_until(|| logs.count(Level::WARN, "capture request failed") == 1);
}

#[test]
fn stop_processing_waits_for_everything_enqueued_before_it() {
    let transport = MockTransport::default();
    let bodies = transport.bodies.clone();
    let client = client_with(transport);

    for i in 0..20 {
        client.capture(&format!("burst_{i}"), "user-1", None);
    }
    client.stop_processing(None);

    /* Nothing enqueued before the stop may be abandoned. */
    let sent = wait_for_requests(&bodies, 20);
    assert_eq!(sent.len(), 20);
}

/**
 * A fired caller token bounds the drain wait: stop_processing must
 * return promptly even though the queue still holds events.
 */
#[test]
fn a_cancelled_stop_returns_before_the_queue_drains() {
    let (release, gate) = crossbeam_channel::bounded(0);
    let transport = MockTransport {
        gate: Some(gate),
        ..Default::default()
    };
    let bodies = transport.bodies.clone();
    let client = client_with(transport);

    client.capture("first", "user-1", None);
    wait_until(|| bodies.lock().unwrap().len() == 1);
    for i in 0..3 {
        client.capture(&format!("stuck_{i}"), "user-1", None);
    }

    let source = CancellationSource::new();
    let token = source.token();
    source.cancel();

    let started = Instant::now();
    client.stop_processing(Some(&token));
    assert!(started.elapsed() < Duration::from_secs(2));

    drop(release);
}
