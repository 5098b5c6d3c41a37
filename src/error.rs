use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("XMPP error: {0}")]
    Xmpp(Box<tokio_xmpp::Error>),

    #[error("XMPP session closed: {0}")]
    SessionClosed(String),

    #[error("Room join rejected: {0}")]
    JoinRejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Malformed lookup URL: {0}")]
    MalformedUrl(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Wiki HTTP error ({status}): {message}")]
    WikiHttp { status: StatusCode, message: String },

    #[error("Wiki API error ({code}): {info}")]
    WikiApi { code: String, info: String },

    #[error("Malformed wiki response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Wiki response contained no pages")]
    NoPages,

    #[error("Wiki page '{0}' has neither an extract nor a missing flag")]
    MissingExtract(String),

    #[error("Search query is empty")]
    SearchQueryEmpty,

    #[error("Reply channel closed")]
    ReplyChannelClosed,
}

impl From<tokio_xmpp::Error> for BotError {
    fn from(err: tokio_xmpp::Error) -> Self {
        BotError::Xmpp(Box::new(err))
    }
}

impl BotError {
    /// Returns a user-friendly error message suitable for posting into the room
    pub fn user_message(&self) -> String {
        match self {
            BotError::Xmpp(_)
            | BotError::SessionClosed(_)
            | BotError::JoinRejected(_)
            | BotError::ReplyChannelClosed => {
                "Sorry, I'm having trouble talking to the chat server right now.".to_string()
            }
            BotError::Config(_) | BotError::EnvVar(_) => {
                "Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::MalformedUrl(_) => {
                "Sorry, I couldn't build a lookup request for that term.".to_string()
            }
            BotError::Reqwest(_) => {
                "Sorry, I'm having network issues. Please try again in a moment.".to_string()
            }
            BotError::WikiHttp { status, .. } => match *status {
                StatusCode::TOO_MANY_REQUESTS => {
                    "Sorry, the encyclopedia is rate limiting me. Please try again in a few moments.".to_string()
                }
                status if status.is_server_error() => {
                    "Sorry, the encyclopedia is experiencing issues right now. Please try again later.".to_string()
                }
                _ => "Sorry, the encyclopedia rejected my request.".to_string(),
            },
            BotError::WikiApi { .. } | BotError::Json(_) | BotError::NoPages => {
                "Sorry, I received an unexpected response from the encyclopedia.".to_string()
            }
            BotError::MissingExtract(_) => {
                "Sorry, I couldn't find a summary for that term.".to_string()
            }
            BotError::SearchQueryEmpty => "Please tell me what to look up.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
