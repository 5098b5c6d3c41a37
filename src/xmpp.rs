//! XMPP multi-user chat transport.

mod session;
mod stanza;

pub use session::XmppSession;
pub use stanza::{RoomAddress, RoomEvent};
