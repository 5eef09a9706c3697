pub mod slack;

use crate::error::SinkError;
use crate::ingest::types::Item;

/// Successful hand-off to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    pub status: u16,
}

#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Format and deliver one item. Any error means "not delivered".
    async fn notify(&self, item: &Item) -> Result<Delivered, SinkError>;

    fn name(&self) -> &'static str;
}
