/**
 * Wire types for the PostHog capture protocol.
 *
 * A single `CaptureEvent` is the unit of work flowing through the whole
 * pipeline: built by the dispatcher, queued, then serialized and POSTed
 * by the delivery worker. The serde renames below match the `/capture/`
 * endpoint's JSON field names 1:1.
 */
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Arbitrary structured event properties, keyed by name.
/// Insertion order is irrelevant to the backend.
pub type Properties = HashMap<String, Value>;

// ---------------------------------------------------------------------------
// CaptureEvent — the record POSTed to the capture endpoint
// ---------------------------------------------------------------------------

/**
 * One analytics occurrence submitted for delivery.
 *
 * The backend receives:
 * ```json
 * {
 *   "event": "user_signed_up",
 *   "api_key": "phc_...",
 *   "distinct_id": "user-42",
 *   "properties": { ... },
 *   "timestamp": "2024-01-15T10:30:00Z"
 * }
 * ```
 *
 * `timestamp` is captured when the event is enqueued, not when it is
 * sent — queueing delay must not corrupt the ordering the backend sees.
 */
#[derive(Clone, Serialize)]
pub struct CaptureEvent {
    /// Event type identifier, e.g. `"$identify"` or any user event name.
    #[serde(rename = "event")]
    pub name: String,

    /// The project API key, copied from the client at enqueue time.
    #[serde(rename = "api_key")]
    pub api_key: String,

    /// Stable external identifier for the acting entity (user, group, ...).
    #[serde(rename = "distinct_id")]
    pub subject_key: String,

    /// Never absent — an event without properties carries an empty map.
    pub properties: Properties,

    /// UTC time at which `capture` was invoked.
    pub timestamp: DateTime<Utc>,
}
