//! Chat room abstraction used to post replies.
//!
//! [`ChatRoom`] is transport-agnostic; [`ReplySender`] forwards replies to the
//! task that owns the XMPP connection.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{BotError, Result};

/// A room the bot can post plain-text messages into.
#[async_trait]
pub trait ChatRoom: Send + Sync {
    /// Sends a text message to the room.
    async fn send_message(&self, text: &str) -> Result<()>;
}

/// [`ChatRoom`] backed by a channel drained by the XMPP session loop.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: UnboundedSender<String>,
}

impl ReplySender {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ChatRoom for ReplySender {
    async fn send_message(&self, text: &str) -> Result<()> {
        self.tx
            .send(text.to_string())
            .map_err(|_| BotError::ReplyChannelClosed)
    }
}
