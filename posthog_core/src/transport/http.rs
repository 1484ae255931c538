/*!
 * Default HTTP transport for the capture endpoint.
 *
 * Uses `ureq` — a pure-Rust blocking HTTP client with no async runtime.
 * The delivery worker is already a dedicated background thread, so
 * blocking I/O is exactly what we want, and it keeps compile time and
 * binary size down.
 *
 * Design decisions:
 * - **Single attempt** — no retries. Delivery is best-effort; transient
 *   failures are acceptable to drop.
 * - **Statuses are data** — the agent is configured so non-2xx responses
 *   come back as responses, not errors. Classifying them is the worker's
 *   job.
 */

use std::time::Duration;

use ureq::Agent;

use super::{Transport, TransportError, TransportResponse};

/**
 * Thin wrapper around `ureq::Agent` implementing the `Transport` seam.
 *
 * A single instance is created during client construction and moved into
 * the background worker thread. Connection pooling and keep-alive are
 * handled by the agent internally.
 */
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    /**
     * Creates a transport with a configured `ureq::Agent`.
     *
     * Timeouts:
     * - 10 s connect
     * - 30 s total per request
     */
    pub fn new() -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(10)))
            .timeout_global(Some(Duration::from_secs(30)))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn post(&self, endpoint: &str, body: &str) -> Result<TransportResponse, TransportError> {
        let response = self
            .agent
            .post(endpoint)
            .header("Content-Type", "application/json")
            .send(body)?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .unwrap_or_else(|_| "<unreadable body>".into());

        Ok(TransportResponse { status, body })
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        let kind = match &err {
            ureq::Error::Io(_) => "io",
            ureq::Error::Timeout(_) => "timeout",
            _ => "http",
        };

        /*
         * Unwrap to the innermost cause — the operator-facing log line
         * should name what actually went wrong, not the wrapper.
         */
        let mut root: &dyn std::error::Error = &err;
        while let Some(source) = root.source() {
            root = source;
        }

        Self {
            kind,
            message: root.to_string(),
        }
    }
}
