/*!
 * Protocol layer — data structures and reserved names.
 *
 * Everything related to *what* we send to the PostHog backend:
 * - `types` — the CaptureEvent record and its properties map
 * - `constants` — default capture URL, reserved event/property names
 */

pub mod constants;
pub mod types;
