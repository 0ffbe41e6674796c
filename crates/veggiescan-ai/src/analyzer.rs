use anyhow::Result;
use async_trait::async_trait;

/// Remote vision model that inspects a vegetable photo.
///
/// Implementations return the raw assistant message text. Any error
/// (timeout, connection failure, non-2xx status, empty choice list) is a
/// client-level failure: callers log it and fall back, they never surface it
/// to the end user.
#[async_trait]
pub trait ScanAnalyzer: Send + Sync {
    /// Provider name used in logs
    fn provider(&self) -> &str;

    /// Model identifier sent with each request
    fn model_name(&self) -> &str;

    /// Analyze raw image bytes and return the model's message content.
    async fn analyze(&self, image: &[u8]) -> Result<String>;

    /// Reachability probe (optional)
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
