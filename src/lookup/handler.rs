//! Handler for a single inbound room message.

use log::{debug, error, info};

use crate::error::Result;
use crate::room::ChatRoom;
use crate::trigger::extract_query;
use crate::types::IncomingMessage;
use crate::wiki::WikiClient;

/// Runs trigger matching, lookup and reply for one message.
#[derive(Debug, Clone)]
pub struct Responder {
    wiki: WikiClient,
    reply_on_error: bool,
}

impl Responder {
    pub fn new(wiki: WikiClient, reply_on_error: bool) -> Self {
        Self {
            wiki,
            reply_on_error,
        }
    }

    /// Handle one inbound message.
    ///
    /// Returns `true` if a reply was sent, `false` otherwise. Lookup failures
    /// are logged and answered with silence unless `reply_on_error` is set;
    /// only a failure to post the reply is returned as an error.
    pub async fn handle(&self, message: &IncomingMessage, room: &dyn ChatRoom) -> Result<bool> {
        let Some(query) = extract_query(message.body.as_deref()) else {
            return Ok(false);
        };

        info!("Lookup request from {}: '{}'", message.sender, query);

        let reply = match self.wiki.lookup(query).await {
            Ok(result) => result.reply_text().to_string(),
            Err(e) => {
                error!(
                    "Lookup for '{}' requested by {} failed: {}",
                    query, message.sender, e
                );
                if !self.reply_on_error {
                    return Ok(false);
                }
                e.user_message()
            }
        };

        room.send_message(&reply).await?;
        debug!("Replied to {} ({} bytes)", message.sender, reply.len());

        Ok(true)
    }
}
