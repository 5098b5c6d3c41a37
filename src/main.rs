#[tokio::main]
async fn main() -> wikibot::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("wikibot=info,tokio_xmpp=warn"),
    )
    .init();
    log::info!("Starting wikibot");

    match wikibot::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {}", e);
            Err(e)
        }
    }
}
