use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use machine_briefs::{BriefManager, BriefScheduler, JsonFileStore, SettingsStore};
use machine_core::{BriefMessage, MachineConfig, MessageChannel};
use machine_discord::event::INTERACTION_PING;
use machine_discord::{
    AdminAlerts, DiscordChannel, DiscordRest, GatewayClient, Interaction, InteractionResponse,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

use crate::commands::CommandHandler;

#[derive(Parser, Debug)]
#[command(name = "machine", author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "machine.toml")]
    config: PathBuf,

    /// Write logs to daily-rotated files in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Run the scheduler only; briefs are logged instead of posted
    #[arg(long)]
    no_gateway: bool,
}

fn init_tracing(args: &Args) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "machine.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            if args.log_json {
                registry.with(fmt::layer().json().with_writer(writer)).init();
            } else {
                registry
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .init();
            }
            Some(guard)
        }
        None => {
            if args.log_json {
                registry.with(fmt::layer().json()).init();
            } else {
                registry.with(fmt::layer()).init();
            }
            None
        }
    }
}

/// Stand-in channel for `--no-gateway` runs.
struct LogChannel;

#[async_trait]
impl MessageChannel for LogChannel {
    async fn post(&self, channel_id: &str, message: &BriefMessage) -> Result<String> {
        info!("Brief for channel {}:\n{}", channel_id, message.to_plain_text());
        Ok(format!("local-{}", chrono::Utc::now().timestamp_millis()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();
    let _log_guard = init_tracing(&args);

    info!("Initializing La Machine...");
    let config = MachineConfig::load_or_default(&args.config);

    let rest = match DiscordRest::new(&config.discord) {
        Ok(rest) => Some(Arc::new(rest)),
        Err(e) if args.no_gateway => {
            warn!("{:#}; running without Discord", e);
            None
        }
        Err(e) => return Err(e),
    };

    let generator = machine_generator::build_generator(&config.llm)?;
    let channel: Arc<dyn MessageChannel> = match &rest {
        Some(rest) if !args.no_gateway => Arc::new(DiscordChannel::new(rest.clone())),
        _ => Arc::new(LogChannel),
    };
    let alerts = Arc::new(AdminAlerts::new(
        rest.clone(),
        config.discord.admin_user_id.clone(),
    ));
    let store = Arc::new(JsonFileStore::new(&config.storage.briefs_path));
    info!("Brief store: {}", store.path().display());

    let manager = Arc::new(BriefManager::load(generator, channel, alerts, store).await);
    let settings = Arc::new(SettingsStore::load(&config.storage.settings_path).await);

    let restored = manager.get_active_briefs().await.len();
    if restored > 0 {
        info!("Restored {} active briefs from previous session", restored);
        let expired = manager.get_expired_briefs().await.len();
        if expired > 0 {
            info!("Found {} briefs that expired during downtime", expired);
        }
    }

    let scheduler = BriefScheduler::new(manager.clone(), settings.clone(), config.scheduler.clone());
    scheduler.start().await?;

    match rest.filter(|_| !args.no_gateway) {
        Some(rest) => {
            register_commands(&rest, config.discord.application_id.as_deref()).await;
            let handler = Arc::new(CommandHandler::new(manager.clone(), settings.clone()));
            let (gateway, mut interactions) =
                GatewayClient::connect(&config.discord.gateway_url, rest.token())?;

            loop {
                tokio::select! {
                    interaction = interactions.recv() => {
                        let Some(interaction) = interaction else { break };
                        let rest = rest.clone();
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            answer(&rest, &handler, interaction).await;
                        });
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            gateway.shutdown();
        }
        None => {
            info!("Gateway disabled; scheduler running until Ctrl-C");
            tokio::signal::ctrl_c().await?;
        }
    }

    info!("Shutting down...");
    scheduler.stop().await;
    let stats = manager.stats().await;
    info!(
        "Leaving {} active briefs ({} overdue); {} completed, {} cancelled this session",
        stats.active, stats.overdue, stats.completed, stats.cancelled
    );
    Ok(())
}

async fn register_commands(rest: &DiscordRest, application_id: Option<&str>) {
    let Some(application_id) = application_id else {
        error!("Missing DISCORD_CLIENT_ID; slash commands not registered");
        return;
    };
    info!("Started refreshing application (/) commands.");
    match rest
        .register_commands(application_id, &machine_discord::commands::all_commands())
        .await
    {
        Ok(()) => info!("Successfully reloaded application (/) commands."),
        Err(e) => error!("Error deploying commands: {:#}", e),
    }
}

async fn answer(rest: &DiscordRest, handler: &CommandHandler, interaction: Interaction) {
    if interaction.kind == INTERACTION_PING {
        if let Err(e) = rest
            .respond(&interaction.id, &interaction.token, &InteractionResponse::pong())
            .await
        {
            error!("Failed to answer ping: {:#}", e);
        }
        return;
    }
    if !interaction.is_command() {
        return;
    }

    let name = interaction.command_name().unwrap_or_default().to_string();
    let result = if CommandHandler::defers(&interaction) {
        match rest
            .respond(&interaction.id, &interaction.token, &InteractionResponse::deferred())
            .await
        {
            Ok(()) => {
                let reply = handler.handle(&interaction).await;
                rest.edit_original_response(
                    &interaction.application_id,
                    &interaction.token,
                    &reply.content,
                )
                .await
            }
            Err(e) => Err(e),
        }
    } else {
        let reply = handler.handle(&interaction).await;
        rest.respond(
            &interaction.id,
            &interaction.token,
            &InteractionResponse::message(&reply.content, reply.ephemeral),
        )
        .await
    };

    if let Err(e) = result {
        error!("Error executing command {}: {:#}", name, e);
    }
}
