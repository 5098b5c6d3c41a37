//! Request/reply flow for `?wiki` lookups.

mod dispatcher;
mod handler;

pub use dispatcher::Dispatcher;
pub use handler::Responder;
