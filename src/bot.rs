//! Bot wiring: configuration, lookup dispatch and the XMPP session.

use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::Result;
use crate::lookup::{Dispatcher, Responder};
use crate::room::ReplySender;
use crate::wiki::WikiClient;
use crate::xmpp::XmppSession;

/// Run the wiki bot until Ctrl-C.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    debug!("Initializing wiki client for {}", config.wiki_api_url);
    let wiki = WikiClient::new(&config.wiki_api_url, config.lookup_timeout)?;
    let responder = Responder::new(wiki, config.reply_on_error);

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(
        responder,
        Arc::new(ReplySender::new(reply_tx)),
        config.max_in_flight,
    );

    let session = XmppSession::new(&config)?;
    info!(
        "Starting XMPP session for room {} as {}",
        session.address().room(),
        config.xmpp_nick
    );

    tokio::select! {
        result = session.run(&dispatcher, &mut reply_rx) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    Ok(())
}
