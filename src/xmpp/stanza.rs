//! Conversion between XMPP stanzas and bot messages for one room.

use tokio_xmpp::parsers::{
    BareJid, Element, Jid,
    message::{Body, Message, MessageType},
    presence::{Presence, Type as PresenceType},
};

use crate::error::{BotError, Result};
use crate::types::IncomingMessage;

/// Namespace of the XEP-0045 join payload.
pub const MUC_NS: &str = "http://jabber.org/protocol/muc";
const MUC_USER_NS: &str = "http://jabber.org/protocol/muc#user";
const SELF_PRESENCE_CODE: &str = "110";

/// The joined room and the bot's occupant nickname in it.
#[derive(Debug, Clone)]
pub struct RoomAddress {
    room: BareJid,
    occupant: Jid,
    nick: String,
}

impl RoomAddress {
    pub fn new(room: &str, nick: &str) -> Result<Self> {
        let room: BareJid = room
            .parse()
            .map_err(|e| BotError::Config(format!("Invalid room JID '{room}': {e}")))?;
        let occupant: Jid = format!("{room}/{nick}")
            .parse()
            .map_err(|e| BotError::Config(format!("Invalid room nickname '{nick}': {e}")))?;

        Ok(Self {
            room,
            occupant,
            nick: nick.to_string(),
        })
    }

    pub fn room(&self) -> &BareJid {
        &self.room
    }

    /// Presence that enters the room without requesting discussion history.
    pub fn join_presence(&self) -> Element {
        let mut presence = Presence::new(PresenceType::None).with_to(self.occupant.clone());
        presence.payloads.push(
            Element::builder("x", MUC_NS)
                .append(
                    Element::builder("history", MUC_NS)
                        .attr("maxstanzas", "0")
                        .build(),
                )
                .build(),
        );
        presence.into()
    }

    /// Plain-text groupchat message addressed to the room.
    pub fn groupchat(&self, text: &str) -> Element {
        let mut message = Message::new(Some(Jid::from(self.room.clone())));
        message.type_ = MessageType::Groupchat;
        message
            .bodies
            .insert(String::new(), Body(text.to_string()));
        message.into()
    }

    /// Sorts an inbound stanza into the room events the session acts on.
    ///
    /// `own_nick` is the nickname the room assigned to the bot (the
    /// configured one until the join is confirmed). Returns `None` for
    /// anything unrelated to this room.
    pub fn classify(&self, stanza: Element, own_nick: &str) -> Option<RoomEvent> {
        if stanza.name() == "presence" {
            self.classify_presence(stanza)
        } else {
            self.incoming(stanza, own_nick).map(RoomEvent::Message)
        }
    }

    fn classify_presence(&self, stanza: Element) -> Option<RoomEvent> {
        let presence = Presence::try_from(stanza).ok()?;
        let from = presence.from.as_ref()?.to_string();
        let (room, nick) = from.split_once('/').unwrap_or((from.as_str(), ""));
        if !self.is_room(room) {
            return None;
        }

        if matches!(presence.type_, PresenceType::Error) {
            let condition = presence
                .payloads
                .iter()
                .find(|payload| payload.name() == "error")
                .and_then(|error| error.children().next())
                .map_or_else(|| "unknown".to_string(), |c| c.name().to_string());
            return Some(RoomEvent::JoinRejected { condition });
        }

        if !has_self_status(&presence.payloads) {
            return None;
        }

        if matches!(presence.type_, PresenceType::Unavailable) {
            Some(RoomEvent::SelfLeft)
        } else {
            Some(RoomEvent::SelfJoined {
                nick: nick.to_string(),
            })
        }
    }

    fn incoming(&self, stanza: Element, own_nick: &str) -> Option<IncomingMessage> {
        let message = Message::try_from(stanza).ok()?;
        if !matches!(message.type_, MessageType::Groupchat) {
            return None;
        }

        let from = message.from.as_ref()?.to_string();
        let (room, nick) = from.split_once('/')?;
        if !self.is_room(room) || nick == own_nick {
            return None;
        }

        let body = message
            .bodies
            .get("")
            .or_else(|| message.bodies.values().next())
            .map(|body| body.0.clone());

        Some(IncomingMessage::new(nick, body))
    }

    fn is_room(&self, jid: &str) -> bool {
        jid.eq_ignore_ascii_case(&self.room.to_string())
    }

    /// Nickname requested in the join presence.
    pub fn nick(&self) -> &str {
        &self.nick
    }
}

/// What an inbound stanza means for the room session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A groupchat message from another occupant.
    Message(IncomingMessage),
    /// The room confirmed our presence (status 110) under `nick`.
    SelfJoined { nick: String },
    /// The room refused the join, e.g. `conflict` or `registration-required`.
    JoinRejected { condition: String },
    /// We were removed from the room (kick, ban, shutdown).
    SelfLeft,
}

/// Whether a muc#user payload carries status code 110 (presence refers to us).
fn has_self_status(payloads: &[Element]) -> bool {
    payloads
        .iter()
        .filter(|payload| payload.is("x", MUC_USER_NS))
        .flat_map(Element::children)
        .any(|child| {
            child.is("status", MUC_USER_NS) && child.attr("code") == Some(SELF_PRESENCE_CODE)
        })
}
