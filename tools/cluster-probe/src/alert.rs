use async_trait::async_trait;

/// Sink for failures that need an operator's attention.
#[async_trait]
pub trait Alerter: Send + Sync {
    async fn alert(&self, message: &str);
}

/// Reports alerts as `error` level events.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAlerter;

#[async_trait]
impl Alerter for LogAlerter {
    async fn alert(&self, message: &str) {
        tracing::error!(alert = true, "{}", message);
    }
}
