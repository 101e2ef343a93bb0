//! PromptRelay Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use anyhow::Context;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::UpdateHandler;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use PromptRelay::{
    config::Settings,
    controller::Controller,
    delivery::TelegramTransport,
    handlers::{handle_callback_query, handle_command, handle_message, Command},
    services::ServiceFactory,
    state::AppContext,
    utils::{diagnostics::TracingSink, logging},
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate().context("invalid configuration")?;

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", PromptRelay::info());

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), &settings, Arc::new(TracingSink)).await?;
    let health = services.health_check().await;
    if !health.is_healthy() {
        warn!(issues = ?health.get_issues(), "Services started with issues");
    }

    let admin_store = services.admin_store.clone();
    let context = AppContext::from_factory(services, &settings);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let controller = Arc::new(Controller::new(&context, transport));

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    // Create dispatcher with dependencies registered
    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![controller])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.kind);
        })
        .enable_ctrlc_handler()
        .build();

    info!("Starting bot with polling mode...");
    dispatcher.dispatch().await;

    admin_store.teardown();
    info!("PromptRelay bot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    // Handle commands
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_commands),
                )
                .branch(
                    // Handle regular messages
                    dptree::endpoint(handle_messages),
                ),
        )
        .branch(
            // Handle callback queries
            Update::filter_callback_query().endpoint(handle_callbacks),
        )
}

/// Handle bot commands
async fn handle_commands(msg: Message, cmd: Command, controller: Arc<Controller>) -> HandlerResult {
    if let Err(e) = handle_command(msg, cmd, controller).await {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }
    Ok(())
}

/// Handle regular messages
async fn handle_messages(msg: Message, controller: Arc<Controller>) -> HandlerResult {
    if let Err(e) = handle_message(msg, controller).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }
    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(bot: Bot, query: CallbackQuery, controller: Arc<Controller>) -> HandlerResult {
    let user_id = query.from.id.0 as i64;
    if let Err(e) = handle_callback_query(bot, query, controller).await {
        error!(user_id = user_id, error = %e, "Error handling callback query");
        return Err(e.into());
    }
    Ok(())
}
