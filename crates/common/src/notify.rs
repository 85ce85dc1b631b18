use async_trait::async_trait;

/// One-way notification sink.
///
/// Returns whether the message was delivered. Implementations log the
/// failure detail themselves; a dropped notification is never retried and
/// never blocks the caller's state transitions.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, text: &str) -> bool;
}
