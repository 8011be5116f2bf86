// This is the entry point of the Telegram moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases)
// - `telegram/` = Telegram-specific adapters (commands, message handling)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Telegram dispatcher
// 4. Register commands and message handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "telegram/telegram_layer.rs"]
mod telegram;

use crate::core::moderation::{ContentClassifier, ModerationConfig, ModerationService, WordListService, WordMatcher};
use crate::infra::moderation::SqliteWordStore;
use crate::telegram::commands::{self, Command};
use crate::telegram::moderation::{handle_message, TelegramMemberRoles, TelegramTransport};
use crate::telegram::Data;
use std::str::FromStr;
use std::sync::Arc;
use teloxide::prelude::*;

const DEFAULT_DATABASE_PATH: &str = "data/moderation.db";

/// Comma separated list from the environment, or the default when unset.
fn env_list(name: &str, default: Vec<String>) -> Vec<String> {
    match std::env::var(name) {
        Ok(raw) => parse_list(&raw),
        Err(_) => default,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Optional JSON file with any subset of the settings; missing fields keep their defaults.
fn file_config() -> ModerationConfig {
    let Ok(path) = std::env::var("MODERATION_CONFIG_FILE") else {
        return ModerationConfig::default();
    };

    match std::fs::read_to_string(&path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Invalid config file at {}: {}, using defaults", path, e);
            ModerationConfig::default()
        }),
        Err(e) => {
            tracing::warn!("Failed to read config file at {}: {}", path, e);
            ModerationConfig::default()
        }
    }
}

/// Config file first, then individual environment variables on top.
fn load_config() -> ModerationConfig {
    let defaults = file_config();
    ModerationConfig {
        allowed_link_hosts: env_list("ALLOWED_LINK_HOSTS", defaults.allowed_link_hosts),
        blocked_file_extensions: env_list(
            "BLOCKED_FILE_EXTENSIONS",
            defaults.blocked_file_extensions,
        ),
        min_mention_length: env_parse("MIN_MENTION_LENGTH", defaults.min_mention_length),
        group_quiet_period_ms: env_parse("GROUP_QUIET_PERIOD_MS", defaults.group_quiet_period_ms),
        words_per_page: env_parse("WORDS_PER_PAGE", defaults.words_per_page),
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("TELOXIDE_TOKEN").expect(
        "Missing TELOXIDE_TOKEN environment variable! Create a .env file with your bot token.",
    );

    let owner_id = std::env::var("OWNER_ID")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok());
    if owner_id.is_none() {
        tracing::warn!("OWNER_ID is not set; word list commands are disabled");
    }

    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
    let config = load_config();
    tracing::info!(?config, database = %database_path, "Configuration loaded");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let word_store = SqliteWordStore::new(&database_path)
        .await
        .expect("Failed to initialize SQLite word store");

    // The matcher is shared: the word list service rebuilds it, the classifier reads it
    let matcher = Arc::new(WordMatcher::new());
    let word_service = Arc::new(WordListService::new(
        word_store,
        Arc::clone(&matcher),
        config.words_per_page,
    ));
    let loaded = word_service
        .load()
        .await
        .expect("Failed to load banned words");
    tracing::info!(words = loaded, "Banned words loaded");

    let bot = Bot::new(token);

    let classifier = ContentClassifier::new(Arc::clone(&matcher), &config);
    let moderation_service = Arc::new(ModerationService::new(
        classifier,
        Arc::new(TelegramTransport::new(bot.clone())),
        TelegramMemberRoles::new(bot.clone()),
        owner_id,
        config.group_quiet_period(),
    ));

    let data = Data {
        moderation: moderation_service,
        words: word_service,
        owner_id,
    };

    // ========================================================================
    // TELEGRAM DISPATCHER SETUP
    // ========================================================================
    // Commands first, then inline button presses, then everything else
    // goes through moderation.

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(commands::handle_command),
        )
        .branch(Update::filter_callback_query().endpoint(commands::words::handle_callback))
        .branch(Update::filter_message().endpoint(handle_message));

    tracing::info!("🚀 Bot is ready!");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![data])
        .enable_ctrlc_handler()
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .build()
        .dispatch()
        .await;
}
