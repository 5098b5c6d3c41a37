pub mod bot;
pub mod config;
pub mod error;
pub mod lookup;
pub mod room;
pub mod trigger;
pub mod types;
pub mod wiki;
pub mod xmpp;

pub use bot::run;
