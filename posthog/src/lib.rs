/**
 * PostHog — analytics capture client for Rust.
 *
 * This is the crate users should depend on. It re-exports the core
 * client API and adds the scenario-specific identify/group operations as
 * an extension trait over the raw `capture` call.
 *
 * # Quick start
 *
 * ```ignore
 * use posthog::{Client, SubjectMethods};
 *
 * fn main() {
 *     let client = Client::new("phc_YOUR_PROJECT_KEY");
 *
 *     client.capture("user_signed_up", "user-42", None);
 *
 *     // attach persistent properties to the subject
 *     client.identify("user-42", Some(props), None, None);
 *
 *     // drain the queue before exiting
 *     client.stop_processing(None);
 * }
 * ```
 *
 * Delivery is fire-and-forget: capture calls never block on network I/O
 * and never fail — delivery problems surface only as `tracing` output.
 */

use serde_json::Value;

// ---------------------------------------------------------------------------
// Re-exports from posthog_core — the public surface area
// ---------------------------------------------------------------------------

pub use posthog_core::{
    CancellationSource, CancellationToken, CaptureEvent, Client, HttpTransport, Options,
    Properties, Transport, TransportError, TransportResponse, DEFAULT_CAPTURE_URL,
    GROUPS_PROPERTY, GROUP_KEY_PROPERTY, GROUP_SET_PROPERTY, GROUP_TYPE_PROPERTY, IDENTIFY_EVENT,
    SET_ONCE_PROPERTY, SET_PROPERTY,
};

// ---------------------------------------------------------------------------
// SubjectMethods — identify/group layered on top of capture
// ---------------------------------------------------------------------------

/**
 * Scenario-specific recording helpers.
 *
 * Both operations are pure data-shaping over `Client::capture`: they
 * assemble a properties map around the backend's reserved `$`-keys and
 * submit it under the `$identify` event name, so subject identification
 * and group metadata share one wire representation.
 */
pub trait SubjectMethods {
    /**
     * Identifies a subject, attaching persistent properties to it.
     *
     * # Arguments
     * * `subject_key` — your database key for the subject (unique and
     *   constant over all time).
     * * `properties` — name-value pairs that overwrite previous values.
     * * `one_time_properties` — name-value pairs recorded only if the
     *   backend hasn't seen the subject before.
     * * `groups` — group information for the subject; its payload is
     *   expected under the map's own `"$groups"` entry.
     *
     * Absent arguments are omitted from the composite map entirely —
     * they never appear as empty or null entries.
     */
    fn identify(
        &self,
        subject_key: &str,
        properties: Option<Properties>,
        one_time_properties: Option<Properties>,
        groups: Option<Properties>,
    );

    /**
     * Publishes group information, linked to the given subject.
     *
     * # Arguments
     * * `group_type` — the group type (you should have very few — or
     *   even just one — of these).
     * * `group_key` — your database key for the group.
     * * `details` — properties for the group. Add a property called
     *   "name" to give the group a friendly display name.
     */
    fn group(
        &self,
        subject_key: &str,
        group_type: &str,
        group_key: &str,
        details: Option<Properties>,
    );
}

impl SubjectMethods for Client {
    fn identify(
        &self,
        subject_key: &str,
        properties: Option<Properties>,
        one_time_properties: Option<Properties>,
        groups: Option<Properties>,
    ) {
        let mut composite = Properties::new();

        if let Some(properties) = properties {
            composite.insert(SET_PROPERTY.to_string(), nested(properties));
        }

        if let Some(one_time_properties) = one_time_properties {
            composite.insert(SET_ONCE_PROPERTY.to_string(), nested(one_time_properties));
        }

        /*
         * The groups map carries its payload under the reserved "$groups"
         * key; only that entry crosses into the composite map.
         */
        if let Some(mut groups) = groups {
            if let Some(value) = groups.remove(GROUPS_PROPERTY) {
                composite.insert(GROUPS_PROPERTY.to_string(), value);
            }
        }

        self.capture(IDENTIFY_EVENT, subject_key, Some(composite));
    }

    fn group(
        &self,
        subject_key: &str,
        group_type: &str,
        group_key: &str,
        details: Option<Properties>,
    ) {
        let mut properties = Properties::new();

        if let Some(details) = details {
            properties.insert(GROUP_SET_PROPERTY.to_string(), nested(details));
        }

        properties.insert(
            GROUP_TYPE_PROPERTY.to_string(),
            Value::String(group_type.to_string()),
        );
        properties.insert(
            GROUP_KEY_PROPERTY.to_string(),
            Value::String(group_key.to_string()),
        );

        self.capture(IDENTIFY_EVENT, subject_key, Some(properties));
    }
}

/// Wraps a properties map as a JSON object for nesting under a reserved key.
fn nested(properties: Properties) -> Value {
    Value::Object(properties.into_iter().collect())
}
