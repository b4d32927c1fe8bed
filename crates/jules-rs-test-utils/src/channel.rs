use async_trait::async_trait;
use jules_rs_core::{ChannelError, OutboundChannel};
use parking_lot::Mutex;
use std::sync::Arc;

/// Channel that keeps every delivered message.
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl OutboundChannel for RecordingChannel {
    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        self.sent.lock().push(text.to_string());
        Ok(())
    }
}

/// Channel whose transport always rejects the message.
#[derive(Debug, Clone)]
pub struct FailingChannel {
    message: String,
}

impl FailingChannel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl OutboundChannel for FailingChannel {
    async fn send(&self, _text: &str) -> Result<(), ChannelError> {
        Err(ChannelError::Send(self.message.clone()))
    }
}
