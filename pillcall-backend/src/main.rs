use dotenv::dotenv;
use std::sync::Arc;

mod adherence;
mod ai;
mod calendar;
mod channels;
mod clock;
mod commands;
mod config;
mod eligibility;
mod error;
mod http;
mod notify;
mod platform;
mod scheduler;

use adherence::LogStore;
use ai::PromptedGenerator;
use config::Config;
use error::ConfigError;
use notify::ReminderEngine;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let config_path = config::config_path_from_env();
    log::info!("Loading config from {}", config_path.display());

    let config = match Config::load(&config_path, std::env::var("DISCORD_TOKEN").ok()) {
        Ok(config) => config,
        Err(e @ ConfigError::TemplateCreated { .. }) => {
            log::info!("{}", e);
            return;
        }
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Tracking {} user(s), reminders at [{}], log at {}",
        config.registered_users.len(),
        config
            .notify_times
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        config.log_path.display()
    );

    let config = Arc::new(config);
    let store = Arc::new(LogStore::new(config.log_path.clone()));
    let generator = Arc::new(PromptedGenerator::from_config(&config.ai));
    let engine = Arc::new(ReminderEngine::new(config, store, generator));

    if let Err(e) = channels::start_discord_bot(engine).await {
        log::error!("Discord: {}", e);
        std::process::exit(1);
    }
}
