use std::env::{self, VarError};
use std::time::Duration;

use log::{debug, error, info};

use crate::error::{BotError, Result};

const DEFAULT_NICK: &str = "wikibot";
const DEFAULT_WIKI_API_URL: &str = "https://de.wikipedia.org/w/api.php";
const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_IN_FLIGHT: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub xmpp_jid: String,
    pub xmpp_password: String,
    pub xmpp_room: String,
    pub xmpp_nick: String,
    pub wiki_api_url: String,
    pub lookup_timeout: Duration,
    pub max_in_flight: usize,
    pub reply_on_error: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        Self::from_source(|key| env::var(key))
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_source<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let required = |key: &str| {
            var(key).map_err(|e| {
                error!("Failed to load {} from environment: {}", key, e);
                BotError::EnvVar(e)
            })
        };
        let optional = |key: &str| match var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(e) => Err(BotError::EnvVar(e)),
        };

        let xmpp_jid = required("XMPP_JID")?;
        let xmpp_password = required("XMPP_PASSWORD")?;
        let xmpp_room = required("XMPP_ROOM")?;
        let xmpp_nick = optional("XMPP_NICK")?.unwrap_or_else(|| DEFAULT_NICK.to_string());
        let wiki_api_url =
            optional("WIKI_API_URL")?.unwrap_or_else(|| DEFAULT_WIKI_API_URL.to_string());

        let lookup_timeout_secs = match optional("LOOKUP_TIMEOUT_SECS")? {
            Some(raw) => parse_number::<u64>("LOOKUP_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_LOOKUP_TIMEOUT_SECS,
        };
        if lookup_timeout_secs == 0 {
            return Err(BotError::Config(
                "LOOKUP_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let max_in_flight = match optional("MAX_IN_FLIGHT")? {
            Some(raw) => parse_number::<usize>("MAX_IN_FLIGHT", &raw)?,
            None => DEFAULT_MAX_IN_FLIGHT,
        };
        if max_in_flight == 0 {
            return Err(BotError::Config(
                "MAX_IN_FLIGHT must be at least 1".to_string(),
            ));
        }

        let reply_on_error = match optional("REPLY_ON_ERROR")? {
            Some(raw) => parse_flag("REPLY_ON_ERROR", &raw)?,
            None => false,
        };

        if xmpp_jid.trim().is_empty() || xmpp_room.trim().is_empty() {
            return Err(BotError::Config(
                "XMPP_JID and XMPP_ROOM must not be empty".to_string(),
            ));
        }

        info!("Configuration loaded successfully");
        debug!("XMPP account: {}", xmpp_jid);
        debug!("XMPP password length: {} characters", xmpp_password.len());
        debug!("XMPP room: {} as {}", xmpp_room, xmpp_nick);
        debug!("Wiki API URL: {}", wiki_api_url);
        debug!(
            "Lookup timeout: {}s, max in flight: {}, reply on error: {}",
            lookup_timeout_secs, max_in_flight, reply_on_error
        );

        Ok(Self {
            xmpp_jid,
            xmpp_password,
            xmpp_room,
            xmpp_nick,
            wiki_api_url,
            lookup_timeout: Duration::from_secs(lookup_timeout_secs),
            max_in_flight,
            reply_on_error,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BotError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BotError::Config(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}
