use std::sync::Arc;

use clap::Parser;
use herald::{
    config::AppConfig,
    http_client::create_http_client,
    http_server,
    notification::{Notifier, TelegramNotifier},
    persistence::{SqliteNotificationRepository, traits::NotificationRepository},
    throttle::{CooldownTable, ThrottlePolicy},
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing app.yaml.
    #[arg(long)]
    config_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    tracing::debug!("Loading application configuration...");
    let config = Arc::new(AppConfig::new(cli.config_dir.as_deref())?);
    tracing::debug!(
        database_url = %config.database_url,
        listen_address = %config.server.listen_address,
        cooldown_rules = config.cooldowns.len(),
        auth_tokens = config.auth_tokens.len(),
        "Configuration loaded."
    );

    tracing::debug!("Initializing notification log...");
    let repo = Arc::new(SqliteNotificationRepository::new(&config.database_url).await?);
    repo.run_migrations().await?;
    tracing::info!("Database migrations completed.");

    // Duplicate cooldown rules are a configuration error, not an
    // iteration-order gamble.
    let cooldown_table = CooldownTable::new(config.cooldowns.clone())?;
    let throttle = Arc::new(ThrottlePolicy::new(
        cooldown_table,
        Arc::clone(&repo) as Arc<dyn NotificationRepository>,
    ));

    tracing::debug!("Initializing Telegram notifier...");
    let client = Arc::new(create_http_client(config.telegram.request_timeout)?);
    let notifier = Arc::new(TelegramNotifier::new(&config.telegram, client)?);
    tracing::info!(chat_id = %config.telegram.chat_id, "Telegram notifier initialized.");

    tracing::info!("Starting notification relay...");
    http_server::run_server_from_config(
        config,
        Arc::clone(&repo) as Arc<dyn NotificationRepository>,
        notifier as Arc<dyn Notifier>,
        throttle,
    )
    .await;

    // The server only returns after a shutdown signal.
    repo.close().await;
    tracing::info!("Notification relay stopped.");

    Ok(())
}
