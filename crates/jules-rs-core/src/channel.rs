//! Outbound message delivery boundary.

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by an outbound channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Transport rejected the message.
    #[error("send failed: {0}")]
    Send(String),
}

/// Delivers assistant text to the user.
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    /// Deliver one message.
    async fn send(&self, text: &str) -> Result<(), ChannelError>;
}
