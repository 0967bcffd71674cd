use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ai_kitchen_bot::bot::{
    callback_handler, message_handler, webhook, Command, DialogueManager, ManagerSettings,
    TelegramMessenger,
};
use ai_kitchen_bot::config::{env_flag, BotConfig, WebhookConfig};
use ai_kitchen_bot::llm_client::LlmClient;
use ai_kitchen_bot::localization::init_localization;
use ai_kitchen_bot::session_store::InMemorySessionStore;
use ai_kitchen_bot::throttle::GenerationThrottle;

fn init_tracing() {
    let default_level = if env_flag("DEBUG") { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting AI Kitchen Telegram Bot");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let languages = init_localization();
    info!(languages, "Localization initialized");

    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        maintenance = config.maintenance,
        debug = config.debug,
        json_logs = config.log_json,
        webhook = config.webhook.is_some(),
        "Configuration loaded"
    );

    let llm = LlmClient::new(config.llm.clone()).context("failed to build LLM client")?;
    let bot = Bot::new(config.telegram_token.clone());

    let manager = Arc::new(DialogueManager::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(llm),
        Arc::new(TelegramMessenger::new(bot.clone())),
        Arc::new(GenerationThrottle::new(&config.throttle)),
        ManagerSettings::from_config(&config),
    ));

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    match &config.webhook {
        Some(webhook) => run_webhook(bot, manager, webhook).await,
        None => run_polling(bot, manager).await,
    }
}

async fn run_webhook(bot: Bot, manager: Arc<DialogueManager>, config: &WebhookConfig) -> Result<()> {
    let url = reqwest::Url::parse(&config.webhook_url())
        .with_context(|| format!("invalid WEBHOOK_URL: {}", config.base_url))?;

    bot.set_webhook(url.clone())
        .drop_pending_updates(true)
        .await
        .context("failed to register webhook")?;
    info!(url = %url, "Webhook registered");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Webhook server listening");

    axum::serve(listener, webhook::router(bot, manager))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await
        .context("webhook server failed")?;

    info!("Webhook server stopped");
    Ok(())
}

async fn run_polling(bot: Bot, manager: Arc<DialogueManager>) -> Result<()> {
    // A webhook left over from an earlier deployment blocks getUpdates
    if let Err(e) = bot.delete_webhook().await {
        warn!(error = %e, "Failed to delete webhook");
    }

    info!("Bot initialized, starting long polling");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![manager])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
