/**
 * Background worker thread that drains the event queue and delivers
 * events to the capture endpoint.
 *
 * Architecture overview:
 *
 * ```text
 *  ┌─────────────┐    unbounded channel    ┌────────────────┐
 *  │  User code   │ ──── CaptureEvent ────► │  Worker thread  │
 *  │  (any thread)│                         │  (single)       │
 *  └─────────────┘                         └───────┬────────┘
 *                                                  │
 *                                           Transport::post()
 *                                                  │
 *                                           ┌──────▼──────┐
 *                                           │  /capture/   │
 *                                           └─────────────┘
 * ```
 *
 * Events are processed strictly sequentially — at most one in-flight
 * request at any time, in the order they were enqueued. The loop runs
 * until the channel is closed-and-empty (graceful drain) or the
 * construction-time cancellation token fires (disposal).
 *
 * Nothing here ever propagates back to the dispatcher: every failure
 * mode ends in a log line and a dropped event.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{select, Receiver};

use crate::cancel::CancellationToken;
use crate::protocol::types::CaptureEvent;
use super::{Transport, TransportResponse};

// ---------------------------------------------------------------------------
// Worker — the background thread
// ---------------------------------------------------------------------------

/**
 * Handle to the background delivery thread.
 *
 * Spawned during client construction whenever an API key is present. It
 * is fire-and-forget — no join handle is stored; `stop_processing`
 * observes the drain through the queue itself.
 */
pub struct Worker;

impl Worker {
    /**
     * Spawns the delivery thread.
     *
     * # Arguments
     * * `receiver` — the consuming end of the event channel.
     * * `endpoint` — the capture URL to POST events to.
     * * `transport` — the injected HTTP collaborator.
     * * `enabled` — live kill-switch, re-read for every event.
     * * `cancel` — construction-time token; fires at client disposal.
     */
    pub fn spawn(
        receiver: Receiver<CaptureEvent>,
        endpoint: String,
        transport: Box<dyn Transport>,
        enabled: Arc<AtomicBool>,
        cancel: CancellationToken,
    ) -> Result<(), String> {
        thread::Builder::new()
            .name("posthog-worker".into())
            .spawn(move || {
                /*
                 * catch_unwind so a panic inside a transport implementation
                 * is reported instead of silently killing the thread.
                 */
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    Self::run_loop(&receiver, &endpoint, transport.as_ref(), &enabled, &cancel);
                }));

                if result.is_err() {
                    tracing::error!("delivery worker panicked; queued events will be dropped");
                }
            })
            .map(|_| ())
            .map_err(|e| format!("failed to spawn delivery worker thread: {e}"))
    }

    /**
     * The main loop. One dequeued event per iteration:
     *
     * 1. Wait for the next event, the closed-and-empty terminal state, or
     *    the cancellation signal.
     * 2. Re-check the live `enabled` flag — it may have flipped since the
     *    event was enqueued.
     * 3. Serialize and POST, then classify the outcome into log lines.
     */
    fn run_loop(
        receiver: &Receiver<CaptureEvent>,
        endpoint: &str,
        transport: &dyn Transport,
        enabled: &AtomicBool,
        cancel: &CancellationToken,
    ) {
        /* One "calls are disabled" line per worker lifetime, no matter how
         * many events are discarded afterwards. */
        let mut warned_disabled = false;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let event = select! {
                recv(receiver) -> msg => match msg {
                    Ok(event) => event,
                    /* Closed for writing and fully drained — terminal. */
                    Err(_) => break,
                },
                recv(cancel.signal()) -> _ => break,
            };

            if !enabled.load(Ordering::Relaxed) {
                if !warned_disabled {
                    tracing::warn!(
                        "capture calls are disabled; queued events will be discarded"
                    );
                    warned_disabled = true;
                }
                continue;
            }

            let body = match serde_json::to_string(&event) {
                Ok(body) => body,
                Err(err) => {
                    tracing::error!(
                        event = %event.name,
                        error = %err,
                        "failed to serialize capture event; the event will be dropped"
                    );
                    continue;
                }
            };

            match transport.post(endpoint, &body) {
                Ok(response) => log_response(&response),
                /*
                 * A failure observed after the cancellation signal fired is
                 * an expected shutdown race, not an operator-facing error.
                 */
                Err(err) if cancel.is_cancelled() => {
                    tracing::debug!(error = %err, "capture request cancelled during shutdown");
                }
                Err(err) => {
                    tracing::error!(
                        kind = err.kind,
                        error = %err.message,
                        "unable to deliver capture event; the event will be dropped"
                    );
                }
            }
        }
    }
}

/**
 * Maps a completed HTTP response to its operator-facing log line.
 * 2xx is the happy path and stays silent.
 */
fn log_response(response: &TransportResponse) {
    if response.is_success() {
        return;
    }

    match response.status {
        400 => tracing::warn!(
            status = response.status,
            body = %response.body,
            "capture request rejected; typically the api key did not map to an active project or the payload was malformed"
        ),
        401 => tracing::warn!(
            status = response.status,
            body = %response.body,
            "capture request unauthorized; typically the api key is invalid"
        ),
        status => tracing::warn!(
            status,
            body = %response.body,
            "capture request failed"
        ),
    }
}
