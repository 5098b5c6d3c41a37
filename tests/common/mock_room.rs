//! Recording implementation of [`wikibot::room::ChatRoom`] for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wikibot::error::Result;
use wikibot::room::ChatRoom;

/// Mock room that keeps every sent message in order.
#[derive(Debug, Default)]
pub struct MockRoom {
    sent: Mutex<Vec<String>>,
}

impl MockRoom {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatRoom for MockRoom {
    async fn send_message(&self, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
