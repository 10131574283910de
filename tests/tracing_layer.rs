//! Delivering `tracing` events through `HookLayer`.

mod test_utils;

use std::sync::Arc;

use logentries_hook::{
    ConnectionPolicy, Level, testing::ScriptedDialer, tracing_compat::HookLayer,
};
use rstest::rstest;
use serde_json::json;
use test_utils::{parse_line, scripted_hook};
use tracing_subscriber::layer::SubscriberExt;

#[rstest]
fn events_at_priority_reach_the_wire() {
    let dialer = ScriptedDialer::new();
    let (_sleeper, hook) = scripted_hook(&dialer, ConnectionPolicy::Reuse, Level::Info);
    let hook = Arc::new(hook);
    let subscriber = tracing_subscriber::registry().with(HookLayer::new(Arc::clone(&hook)));

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!(target: "worker", "skipped");
        tracing::info!(target: "worker", job = 7_i64, queue = "emails", "job finished");
    });

    let lines = dialer.lines();
    assert_eq!(lines.len(), 1);
    let body = parse_line(&lines[0]);
    assert_eq!(body["level"], json!("info"));
    assert_eq!(body["msg"], json!("job finished"));
    assert_eq!(body["job"], json!(7));
    assert_eq!(body["queue"], json!("emails"));
}

#[rstest]
fn reserved_field_names_are_prefixed() {
    let dialer = ScriptedDialer::new();
    let (_sleeper, hook) = scripted_hook(&dialer, ConnectionPolicy::PerWrite, Level::Info);
    let subscriber = tracing_subscriber::registry().with(HookLayer::new(hook));

    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(target: "api", level = "custom", time = 3_u64, "clash");
    });

    let body = parse_line(&dialer.lines()[0]);
    assert_eq!(body["level"], json!("warning"));
    assert_eq!(body["fields.level"], json!("custom"));
    assert_eq!(body["fields.time"], json!(3));
}
