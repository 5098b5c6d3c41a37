//! Runs lookups off the event loop with a bound on in-flight requests.

use std::sync::Arc;

use log::{debug, error, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::room::ChatRoom;
use crate::trigger::extract_query;
use crate::types::IncomingMessage;

use super::handler::Responder;

/// Requests admitted per in-flight slot, counting the running one.
const ADMITTED_PER_SLOT: usize = 4;

/// Spawns one task per triggered message; at most `max_in_flight` run at once.
///
/// At most `max_in_flight * 4` requests are admitted (running or waiting);
/// further requests are dropped with a warning until a task finishes.
#[derive(Clone)]
pub struct Dispatcher {
    responder: Arc<Responder>,
    room: Arc<dyn ChatRoom>,
    in_flight: Arc<Semaphore>,
    admitted: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(responder: Responder, room: Arc<dyn ChatRoom>, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            responder: Arc::new(responder),
            room,
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            admitted: Arc::new(Semaphore::new(max_in_flight * ADMITTED_PER_SLOT)),
        }
    }

    /// Hands `message` to a background task if it carries a lookup request.
    ///
    /// Returns the task handle, or `None` when the message is ignored or
    /// dropped because too many requests are already admitted.
    pub fn dispatch(&self, message: IncomingMessage) -> Option<JoinHandle<()>> {
        extract_query(message.body.as_deref())?;

        let Ok(admission) = Arc::clone(&self.admitted).try_acquire_owned() else {
            warn!(
                "Too many pending lookups, dropping request from {}",
                message.sender
            );
            return None;
        };

        if self.in_flight.available_permits() == 0 {
            debug!(
                "All lookup slots busy, request from {} waits for a slot",
                message.sender
            );
        }

        let responder = Arc::clone(&self.responder);
        let room = Arc::clone(&self.room);
        let in_flight = Arc::clone(&self.in_flight);

        Some(tokio::spawn(async move {
            let _admission = admission;
            let Ok(_permit) = in_flight.acquire_owned().await else {
                warn!("Lookup slots closed, dropping request from {}", message.sender);
                return;
            };

            if let Err(e) = responder.handle(&message, room.as_ref()).await {
                error!("Failed to reply to {}: {}", message.sender, e);
            }
        }))
    }
}
