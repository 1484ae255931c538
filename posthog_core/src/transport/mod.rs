/**
 * Transport layer — HTTP delivery and the background worker thread.
 *
 * Everything related to *how* we deliver events to the capture endpoint:
 * - the `Transport` seam the worker POSTs through
 * - `http` — ureq-based default implementation
 * - `worker` — background thread that drains the event queue
 */

pub mod http;
pub mod worker;

pub use http::HttpTransport;
pub use worker::Worker;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Transport — the injected HTTP collaborator
// ---------------------------------------------------------------------------

/**
 * The HTTP capability the delivery worker consumes.
 *
 * The contract is deliberately narrow: POST a JSON document to an
 * endpoint, report the status code and raw response body. The worker owns
 * serialization and outcome classification; implementations own
 * connection management and timeouts.
 *
 * A custom implementation can be injected through `Options::transport`;
 * the default is `HttpTransport`.
 */
pub trait Transport: Send {
    /**
     * POSTs `body` to `endpoint` with a JSON content type.
     *
     * Non-2xx statuses are NOT errors at this seam — they come back as a
     * normal `TransportResponse` for the worker to classify. `Err` is
     * reserved for requests that produced no HTTP response at all.
     */
    fn post(&self, endpoint: &str, body: &str) -> Result<TransportResponse, TransportError>;
}

/**
 * Status code and raw body text of a completed capture request.
 */
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/**
 * A request that failed without producing an HTTP response.
 */
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    /// Coarse failure category: "io", "timeout", or "http".
    pub kind: &'static str,

    /// Root-cause message, unwrapped through the source chain.
    pub message: String,
}
