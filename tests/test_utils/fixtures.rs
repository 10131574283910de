//! Fixtures building hooks over a scripted network so integration tests can
//! observe every dial, write and retry delay without opening sockets.

use logentries_hook::{
    ConnectionPolicy, Level, LogentriesHook,
    testing::{RecordingSleeper, ScriptedDialer},
};
use serde_json::Value;

/// Account token used by every fixture hook.
pub const TOKEN: &str = "2bfbea1e-10c3-4419-bdad-7e6435882e1f";

/// Build a hook at `priority` over `dialer`, recording retry delays.
pub fn scripted_hook(
    dialer: &ScriptedDialer,
    policy: ConnectionPolicy,
    priority: Level,
) -> (RecordingSleeper, LogentriesHook) {
    let sleeper = RecordingSleeper::new();
    let hook = LogentriesHook::builder(TOKEN)
        .with_priority(priority)
        .with_policy(policy)
        .with_dialer(dialer.clone())
        .with_sleeper(sleeper.clone())
        .build()
        .expect("scripted hook should build");
    (sleeper, hook)
}

/// Strip the token prefix and trailing newline from `line` and parse the
/// JSON body.
pub fn parse_line(line: &[u8]) -> Value {
    let text = std::str::from_utf8(line).expect("line should be UTF-8");
    let body = text
        .strip_prefix(TOKEN)
        .expect("line should start with the token")
        .strip_suffix('\n')
        .expect("line should end with a newline");
    serde_json::from_str(body).expect("body should be JSON")
}
