/**
 * The capture client — central orchestrator that owns the event queue,
 * background worker, and transport.
 *
 * Lifecycle:
 * 1. `Client::new(api_key)` creates the queue, spawns the delivery
 *    worker, and wires the construction-time cancellation source. An
 *    empty key short-circuits all of that: the client comes up
 *    permanently disabled with no queue and no thread.
 * 2. `capture()` (and the facade's identify/group helpers on top of it)
 *    builds a timestamped event and enqueues it. Never blocks on network
 *    I/O, never surfaces an error to the caller.
 * 3. `stop_processing()` closes the queue for writes and waits for the
 *    worker to drain what was already enqueued.
 * 4. Dropping the client is the unconditional teardown: it fires the
 *    cancellation signal, so whatever is still queued or in flight is
 *    abandoned.
 *
 * The client is `Send + Sync`; arbitrary threads may share one instance
 * and call `capture` concurrently. There is exactly one consumer — the
 * worker thread spawned here.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};

use crate::cancel::{CancellationSource, CancellationToken};
use crate::protocol::constants::DEFAULT_CAPTURE_URL;
use crate::protocol::types::{CaptureEvent, Properties};
use crate::transport::{HttpTransport, Transport, Worker};

/// Interval between queue-depth checks while `stop_processing` drains.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/**
 * Construction-time configuration. There is no other kind: the client
 * reads no config files and keeps no persisted state.
 *
 * # Example
 * ```ignore
 * let client = posthog_core::Client::with_options("phc_KEY", posthog_core::Options {
 *     endpoint: Some("https://eu.posthog.com/capture/".into()),
 *     ..Default::default()
 * });
 * ```
 */
#[derive(Default)]
pub struct Options {
    /// Overrides the capture URL. Defaults to `DEFAULT_CAPTURE_URL`.
    pub endpoint: Option<String>,

    /// Overrides the HTTP collaborator. Defaults to `HttpTransport`.
    /// Tests inject recording mocks here.
    pub transport: Option<Box<dyn Transport>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/**
 * The capture client.
 *
 * Owns the producer side of the event queue and the lifecycle of the
 * background delivery worker.
 */
pub struct Client {
    /// Copied into every event at enqueue time.
    api_key: String,

    /// Live kill-switch, shared with the worker. Plain relaxed
    /// loads/stores — a brief window of stale reads is tolerable.
    enabled: Arc<AtomicBool>,

    /// `None` when constructed without an API key: no queue, no worker.
    pipeline: Option<Pipeline>,
}

/// Queue handles and the disposal signal for a live (keyed) client.
struct Pipeline {
    /// Producer side. Taken (dropped) by `stop_processing` to close the
    /// queue for writes.
    sender: Mutex<Option<Sender<CaptureEvent>>>,

    /// Monitor clone used only for depth polling — never received from;
    /// the worker thread holds the sole consuming handle.
    depth: Receiver<CaptureEvent>,

    /// Construction-time cancellation; fired at disposal.
    cancel: CancellationSource,
}

impl Client {
    /**
     * Creates a client with default options.
     *
     * If `api_key` is empty the client is permanently disabled: all
     * capture calls become zero-overhead no-ops and no background worker
     * is started.
     */
    pub fn new(api_key: &str) -> Self {
        Self::with_options(api_key, Options::default())
    }

    /**
     * Creates a client with an endpoint override and/or injected
     * transport.
     *
     * Never fails: if the worker thread cannot be spawned the client
     * degrades to disabled and logs the cause — analytics must not take
     * the host application down.
     */
    pub fn with_options(api_key: &str, options: Options) -> Self {
        if api_key.is_empty() {
            return Self {
                api_key: String::new(),
                enabled: Arc::new(AtomicBool::new(false)),
                pipeline: None,
            };
        }

        let endpoint = options
            .endpoint
            .unwrap_or_else(|| DEFAULT_CAPTURE_URL.to_string());
        let transport = options
            .transport
            .unwrap_or_else(|| Box::new(HttpTransport::new()));

        /*
         * Unbounded queue: the producer side never blocks, and closing it
         * for writes (dropping the sender) gives the worker a terminal
         * closed-and-empty read state to exit on.
         */
        let (sender, receiver) = crossbeam_channel::unbounded();
        let depth = receiver.clone();

        let enabled = Arc::new(AtomicBool::new(true));
        let cancel = CancellationSource::new();

        let pipeline = match Worker::spawn(
            receiver,
            endpoint,
            transport,
            enabled.clone(),
            cancel.token(),
        ) {
            Ok(()) => Some(Pipeline {
                sender: Mutex::new(Some(sender)),
                depth,
                cancel,
            }),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    "failed to start the delivery worker; the client will be disabled"
                );
                enabled.store(false, Ordering::Relaxed);
                None
            }
        };

        Self {
            api_key: api_key.to_string(),
            enabled,
            pipeline,
        }
    }

    /**
     * The raw capture call — the underlying operation every other
     * recording helper goes through.
     *
     * Builds an event stamped with the current UTC time and enqueues it
     * for the background worker. Fire-and-forget: this never blocks on
     * network I/O and never reports a delivery failure to the caller.
     *
     * No-op when the client is disabled (missing key at construction, or
     * `set_enabled(false)` at runtime).
     */
    pub fn capture(&self, event_name: &str, subject_key: &str, properties: Option<Properties>) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let Some(pipeline) = &self.pipeline else {
            return;
        };

        let event = CaptureEvent {
            name: event_name.to_string(),
            api_key: self.api_key.clone(),
            subject_key: subject_key.to_string(),
            properties: properties.unwrap_or_default(),
            timestamp: Utc::now(),
        };

        let Ok(sender) = pipeline.sender.lock() else {
            return;
        };
        if let Some(sender) = sender.as_ref() {
            if sender.send(event).is_err() {
                tracing::warn!("delivery worker has shut down; dropping event");
            }
        }
    }

    /// True if the client will currently enqueue and send data.
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /**
     * Runtime kill-switch. The worker re-reads this for every dequeued
     * event, so flipping it to false also discards events that were
     * enqueued while enabled.
     *
     * A client constructed without an API key stays disabled for its
     * whole lifetime; this call is then ignored.
     */
    pub fn set_enabled(&self, enabled: bool) {
        if self.pipeline.is_none() {
            return;
        }
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /**
     * Stops accepting new events and waits for the queue to drain.
     *
     * Closes the queue for writes, then polls its depth at a fixed short
     * interval until it is empty or `cancel` fires — whichever comes
     * first. In-flight sends are never cancelled from here.
     *
     * Capture calls made after this point are silently dropped; making
     * them is a bug in the surrounding application.
     */
    pub fn stop_processing(&self, cancel: Option<&CancellationToken>) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };

        if let Ok(mut sender) = pipeline.sender.lock() {
            sender.take();
        }

        while !pipeline.depth.is_empty() {
            if cancel.is_some_and(|token| token.is_cancelled()) {
                break;
            }
            std::thread::sleep(DRAIN_POLL_INTERVAL);
        }
    }
}

impl Drop for Client {
    /**
     * Unconditional teardown: fires the construction-time cancellation
     * signal and closes the queue. Anything still queued — or truly in
     * flight — is abandoned; call `stop_processing` first to drain
     * gracefully. The worker releases the transport when its loop exits.
     */
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.cancel.cancel();
        }
    }
}
