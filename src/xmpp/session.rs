//! XMPP connection lifecycle: login, room join, event loop, reconnect.

use std::time::Duration;

use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_xmpp::{AsyncClient, Event, parsers::BareJid};

use crate::config::Config;
use crate::error::{BotError, Result};
use crate::lookup::Dispatcher;

use super::stanza::{RoomAddress, RoomEvent};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential reconnect delay, doubled per failure and capped.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self {
            initial,
            current: initial,
            max,
        }
    }

    /// Returns the delay to wait now and doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(INITIAL_BACKOFF, MAX_BACKOFF)
    }
}

/// An owned session in one room.
#[derive(Debug, Clone)]
pub struct XmppSession {
    jid: BareJid,
    password: String,
    address: RoomAddress,
}

impl XmppSession {
    pub fn new(config: &Config) -> Result<Self> {
        let jid: BareJid = config.xmpp_jid.parse().map_err(|e| {
            BotError::Config(format!("Invalid XMPP_JID '{}': {}", config.xmpp_jid, e))
        })?;
        let address = RoomAddress::new(&config.xmpp_room, &config.xmpp_nick)?;

        Ok(Self {
            jid,
            password: config.xmpp_password.clone(),
            address,
        })
    }

    pub fn address(&self) -> &RoomAddress {
        &self.address
    }

    /// Keeps the bot connected, reconnecting with backoff after every failure.
    ///
    /// Replies queued while disconnected are sent after the room is rejoined.
    pub async fn run(
        &self,
        dispatcher: &Dispatcher,
        replies: &mut UnboundedReceiver<String>,
    ) -> Result<()> {
        let mut backoff = Backoff::default();
        let mut unsent = None;

        loop {
            match self
                .connect_and_serve(dispatcher, replies, &mut unsent, &mut backoff)
                .await
            {
                Ok(()) => {
                    info!("Reply channel closed, leaving {}", self.address.room());
                    return Ok(());
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    error!("XMPP session failed: {}", e);
                    warn!("Reconnecting in {}s", delay.as_secs());
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One connection: log in, join, then serve until the session fails.
    ///
    /// A reply whose send failed is parked in `unsent` and goes out first
    /// once the next session has joined the room.
    async fn connect_and_serve(
        &self,
        dispatcher: &Dispatcher,
        replies: &mut UnboundedReceiver<String>,
        unsent: &mut Option<String>,
        backoff: &mut Backoff,
    ) -> Result<()> {
        info!("Connecting to XMPP server as {}", self.jid);
        let mut client = AsyncClient::new(self.jid.clone(), self.password.clone());
        client.set_reconnect(false);

        let mut own_nick = self.address.nick().to_string();
        let mut joined = false;

        loop {
            tokio::select! {
                event = client.next() => {
                    let Some(event) = event else {
                        return Err(BotError::SessionClosed("event stream ended".to_string()));
                    };

                    match event {
                        Event::Online { bound_jid, resumed } => {
                            info!("Logged in as {} (resumed: {})", bound_jid, resumed);
                            client.send_stanza(self.address.join_presence()).await?;
                            debug!("Join requested for {}", self.address.room());
                        }
                        Event::Stanza(stanza) => {
                            match self.address.classify(stanza, &own_nick) {
                                Some(RoomEvent::Message(message)) => {
                                    debug!(
                                        "Message from {}: {:?}",
                                        message.sender, message.body
                                    );
                                    dispatcher.dispatch(message);
                                }
                                Some(RoomEvent::SelfJoined { nick }) => {
                                    if !joined {
                                        info!("Joined {} as {}", self.address.room(), nick);
                                        backoff.reset();
                                    }
                                    own_nick = nick;
                                    joined = true;

                                    if let Some(reply) = unsent.take() {
                                        send_or_park(reply, unsent, |text| {
                                            client.send_stanza(self.address.groupchat(text))
                                        })
                                        .await?;
                                    }
                                }
                                Some(RoomEvent::JoinRejected { condition }) => {
                                    return Err(BotError::JoinRejected(condition));
                                }
                                Some(RoomEvent::SelfLeft) => {
                                    return Err(BotError::SessionClosed(format!(
                                        "removed from {}",
                                        self.address.room()
                                    )));
                                }
                                None => {}
                            }
                        }
                        Event::Disconnected(e) => return Err(e.into()),
                    }
                }
                reply = replies.recv(), if joined => {
                    let Some(reply) = reply else {
                        return Ok(());
                    };
                    send_or_park(reply, unsent, |text| {
                        client.send_stanza(self.address.groupchat(text))
                    })
                    .await?;
                }
            }
        }
    }
}

/// Sends `reply`; on failure keeps it in `unsent` for the next session.
async fn send_or_park<F, Fut, E>(reply: String, unsent: &mut Option<String>, send: F) -> Result<()>
where
    F: FnOnce(&str) -> Fut,
    Fut: Future<Output = std::result::Result<(), E>>,
    BotError: From<E>,
{
    if let Err(e) = send(&reply).await {
        *unsent = Some(reply);
        return Err(e.into());
    }
    Ok(())
}
