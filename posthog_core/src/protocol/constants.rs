/**
 * SDK-wide constants.
 *
 * The `$`-prefixed names are reserved by the PostHog ingestion protocol:
 * the backend gives them special meaning, so they must match the wire
 * format exactly.
 */

/// The default capture URL, pointing to the US PostHog servers.
pub const DEFAULT_CAPTURE_URL: &str = "https://app.posthog.com/capture/";

/// Reserved event name carrying subject identification and group metadata.
pub const IDENTIFY_EVENT: &str = "$identify";

/// Subject properties that overwrite previously recorded values.
pub const SET_PROPERTY: &str = "$set";

/// Subject properties applied only if the backend has not seen them before.
pub const SET_ONCE_PROPERTY: &str = "$set_once";

/// Group-membership data attached to a subject.
pub const GROUPS_PROPERTY: &str = "$groups";

/// Property set recorded against a group rather than a subject.
pub const GROUP_SET_PROPERTY: &str = "$group_set";

/// The group type, e.g. "company". Projects should have very few of these.
pub const GROUP_TYPE_PROPERTY: &str = "$group_type";

/// The caller's stable database key for the group.
pub const GROUP_KEY_PROPERTY: &str = "$group_key";
