//! Send/Sync guarantees for core types.

use logentries_hook::{
    ConnectionManager, DeliveryEngine, HookBuilder, JsonFormatter, LogentriesHook,
    NetworkDialer, SharedFormatter, log_compat::HookLogger, tracing_compat::HookLayer,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn builders_are_send_sync() {
    assert_impl_all!(HookBuilder: Send, Sync, Clone);
    assert_impl_all!(JsonFormatter: Send, Sync);
    assert_impl_all!(SharedFormatter: Send, Sync);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(LogentriesHook: Send, Sync);
    assert_impl_all!(DeliveryEngine: Send, Sync);
    assert_impl_all!(ConnectionManager: Send, Sync);
    assert_impl_all!(NetworkDialer: Send, Sync);
    assert_impl_all!(HookLogger<LogentriesHook>: Send, Sync, log::Log);
    assert_impl_all!(HookLayer<LogentriesHook>: Send, Sync);
}
