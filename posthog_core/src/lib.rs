/*!
 * PostHog Core — the internal capture engine.
 *
 * This crate provides the event queue, background delivery worker, and
 * HTTP transport. End users should depend on the `posthog` facade crate
 * instead, which re-exports everything and layers the identify/group
 * helpers on top of the raw capture call.
 *
 * # Module structure
 *
 * - `protocol/` — what we send: wire types, reserved names
 * - `transport/` — how we deliver: transport seam, HTTP client, worker
 * - `client` — client lifecycle: construction, capture, shutdown
 * - `cancel` — cooperative cancellation for the worker and shutdown
 */

mod cancel;
mod client;
mod protocol;
mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use cancel::{CancellationSource, CancellationToken};
pub use client::{Client, Options};
pub use protocol::constants::{
    DEFAULT_CAPTURE_URL, GROUPS_PROPERTY, GROUP_KEY_PROPERTY, GROUP_SET_PROPERTY,
    GROUP_TYPE_PROPERTY, IDENTIFY_EVENT, SET_ONCE_PROPERTY, SET_PROPERTY,
};
pub use protocol::types::{CaptureEvent, Properties};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
