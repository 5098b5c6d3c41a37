//! Common types used throughout the wikibot.

/// A chat message delivered from the joined room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Occupant nickname of the sender
    pub sender: String,
    /// Text body; `None` for body-less stanzas such as subject changes or chat states
    pub body: Option<String>,
}

impl IncomingMessage {
    pub fn new(sender: impl Into<String>, body: Option<String>) -> Self {
        Self {
            sender: sender.into(),
            body,
        }
    }
}
