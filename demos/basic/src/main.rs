/**
 * Minimal test harness for the PostHog capture client.
 *
 * Replace the KEY constant with a real project API key from your PostHog
 * project settings, then run:
 *
 *   cargo run -p posthog_demo
 *   cargo run -p posthog_demo -- --disabled   # test the runtime kill-switch
 */
use std::collections::HashMap;

use posthog::{Client, SubjectMethods};

/// Paste your project API key here.
const KEY: &str = "PASTE_YOUR_PROJECT_KEY_HERE";

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let test_disabled = args.iter().any(|a| a == "--disabled");

    let client = Client::new(KEY);

    if test_disabled {
        println!("[demo] Disabling the client — captures below should be discarded");
        client.set_enabled(false);
    }

    /*
     * A plain capture call.
     */
    client.capture(
        "demo_started",
        "demo-user",
        Some(HashMap::from([(
            "source".to_string(),
            serde_json::json!("demo"),
        )])),
    );
    println!("[demo] Captured demo_started");

    /*
     * Attach persistent properties to the subject.
     */
    client.identify(
        "demo-user",
        Some(HashMap::from([(
            "plan".to_string(),
            serde_json::json!("free"),
        )])),
        Some(HashMap::from([(
            "first_seen_via".to_string(),
            serde_json::json!("demo"),
        )])),
        None,
    );
    println!("[demo] Identified demo-user");

    /*
     * Link the subject to a group.
     */
    client.group(
        "demo-user",
        "company",
        "acme",
        Some(HashMap::from([(
            "name".to_string(),
            serde_json::json!("Acme"),
        )])),
    );
    println!("[demo] Grouped demo-user under acme");

    /*
     * Drain the queue before exiting — dropping the client without
     * stopping abandons whatever is still queued.
     */
    client.stop_processing(None);
    println!("[demo] Done");
}
