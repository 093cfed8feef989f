use crate::ports::Pacer;
use async_trait::async_trait;
use std::time::Duration;

/// Real delays via the tokio timer.
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, wait: Duration) {
        tokio::time::sleep(wait).await;
    }
}
