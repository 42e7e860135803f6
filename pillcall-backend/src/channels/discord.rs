use crate::calendar::LEGEND;
use crate::clock;
use crate::commands::{self, CommandReply, Invocation, COMMANDS};
use crate::error::PlatformError;
use crate::notify::{Notice, ReminderEngine, UserCalendar};
use crate::platform::{NoticeSink, ResolvedUser, UserDirectory};
use crate::scheduler::Scheduler;
use async_trait::async_trait;
use serenity::all::{
    ActivityData, ChannelId, Client, Command, CommandInteraction, CommandOptionType, Context,
    CreateCommand, CreateCommandOption, CreateEmbed, CreateEmbedFooter, CreateMessage,
    EditInteractionResponse, EventHandler, GatewayIntents, Http, Interaction, OnlineStatus, Ready,
    ResolvedOption, ResolvedValue, User, UserId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Discord's per-message character limit
const MESSAGE_LIMIT: usize = 2000;

fn resolved_user(user: &User) -> ResolvedUser {
    ResolvedUser {
        id: user.id.to_string(),
        display_name: user.global_name.clone().unwrap_or_else(|| user.name.clone()),
    }
}

/// Format one user's calendar as an embed
fn calendar_embed(calendar: &UserCalendar) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("{} · {}", calendar.user.display_name, calendar.title))
        .description(format!("```\n{}\n```", calendar.grid))
        .footer(CreateEmbedFooter::new(LEGEND))
}

/// Send-side and lookup-side of the Discord connection
pub struct DiscordPlatform {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: ChannelId::new(channel_id),
        }
    }
}

#[async_trait]
impl UserDirectory for DiscordPlatform {
    async fn resolve(&self, user_id: &str) -> Result<ResolvedUser, PlatformError> {
        let id = user_id
            .parse::<u64>()
            .ok()
            .filter(|n| *n != 0)
            .ok_or_else(|| PlatformError::Resolution {
                user_id: user_id.to_string(),
                reason: "not a Discord user id".to_string(),
            })?;

        let user = self
            .http
            .get_user(UserId::new(id))
            .await
            .map_err(|e| PlatformError::Resolution {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(resolved_user(&user))
    }
}

#[async_trait]
impl NoticeSink for DiscordPlatform {
    async fn deliver(&self, notice: &Notice) -> Result<(), PlatformError> {
        let chunks = split_message(&notice.text, MESSAGE_LIMIT);
        let last = chunks.len().saturating_sub(1);

        // Calendars ride along with the final chunk
        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut message = CreateMessage::new().content(chunk);
            if i == last {
                message = message.embeds(notice.calendars.iter().map(calendar_embed).collect());
            }
            self.channel_id
                .send_message(&self.http, message)
                .await
                .map_err(|e| {
                    log::error!("Discord: Failed to send reminder: {}", e);
                    PlatformError::Delivery(e.to_string())
                })?;
        }
        Ok(())
    }
}

struct DiscordHandler {
    engine: Arc<ReminderEngine>,
    scheduler_started: AtomicBool,
}

impl DiscordHandler {
    fn platform(&self, ctx: &Context) -> DiscordPlatform {
        DiscordPlatform::new(ctx.http.clone(), self.engine.config().channel_id)
    }

    fn start_scheduler(&self, ctx: &Context) {
        if self.scheduler_started.swap(true, Ordering::SeqCst) {
            return;
        }

        match Scheduler::new(self.engine.config().notify_times.clone()) {
            Some(scheduler) => {
                let engine = self.engine.clone();
                let platform = Arc::new(self.platform(ctx));
                tokio::spawn(scheduler.run(engine, platform));
            }
            None => {
                log::warn!("No valid notify times configured, scheduled reminders are disabled")
            }
        }
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        let target = command.data.options().into_iter().find_map(|opt| match opt {
            ResolvedOption {
                name: "user",
                value: ResolvedValue::User(user, _),
                ..
            } => Some(resolved_user(user)),
            _ => None,
        });

        let Some(cmd) = commands::parse(&command.data.name, target) else {
            log::warn!("Discord: Unknown command /{}", command.data.name);
            return;
        };

        // Notices can take a while (text generation), so acknowledge first
        let deferred = if cmd.is_private() {
            command.defer_ephemeral(&ctx.http).await
        } else {
            command.defer(&ctx.http).await
        };
        if let Err(e) = deferred {
            log::error!("Discord: Failed to acknowledge /{}: {}", command.data.name, e);
            return;
        }

        let platform = self.platform(ctx);
        let invoker = resolved_user(&command.user);
        let invocation = Invocation {
            engine: &self.engine,
            directory: &platform,
            sink: &platform,
            invoker: &invoker,
            today: clock::today(),
        };

        let reply = match commands::execute(cmd, &invocation).await {
            Ok(reply) => reply,
            Err(e) => CommandReply::new(format!("⚠️ {}", e), Vec::new()),
        };

        let mut response = EditInteractionResponse::new().content(truncate(&reply.content));
        if !reply.calendars.is_empty() {
            response = response.embeds(reply.calendars.iter().map(calendar_embed).collect());
        }
        if let Err(e) = command.edit_response(&ctx.http, response).await {
            log::error!("Discord: Failed to reply to /{}: {}", command.data.name, e);
        }
    }
}

#[serenity::async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("Discord: Bot connected as {}", ready.user.name);

        let status = &self.engine.config().status_message;
        if !status.is_empty() {
            ctx.set_presence(Some(ActivityData::playing(status.as_str())), OnlineStatus::Online);
            log::info!("Discord: Status set to '{}'", status);
        }

        match Command::set_global_commands(&ctx.http, command_definitions()).await {
            Ok(registered) => log::info!("Discord: Synced {} command(s)", registered.len()),
            Err(e) => log::error!("Discord: Failed to sync commands: {}", e),
        }

        self.start_scheduler(&ctx);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.handle_command(&ctx, &command).await;
        }
    }
}

fn command_definitions() -> Vec<CreateCommand> {
    COMMANDS
        .iter()
        .map(|spec| {
            let command = CreateCommand::new(spec.name).description(spec.description);
            if spec.takes_user {
                command.add_option(
                    CreateCommandOption::new(
                        CommandOptionType::User,
                        "user",
                        "Whose record to use (defaults to you)",
                    )
                    .required(false),
                )
            } else {
                command
            }
        })
        .collect()
}

/// Clip a reply to Discord's limit without splitting a character
fn truncate(text: &str) -> String {
    if text.len() <= MESSAGE_LIMIT {
        return text.to_string();
    }
    let mut end = MESSAGE_LIMIT - 3;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Split a message into chunks respecting Discord's character limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if current.len() + line.len() + 1 > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            // If single line is too long, split it on char boundaries
            let mut remaining = line;
            while remaining.len() > max_len {
                let mut cut = max_len;
                while !remaining.is_char_boundary(cut) {
                    cut -= 1;
                }
                chunks.push(remaining[..cut].to_string());
                remaining = &remaining[cut..];
            }
            current = remaining.to_string();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Connect to Discord and serve commands until the client stops
pub async fn start_discord_bot(engine: Arc<ReminderEngine>) -> Result<(), String> {
    let token = engine.config().token.clone();

    // Slash commands need no privileged intents
    let handler = DiscordHandler {
        engine,
        scheduler_started: AtomicBool::new(false),
    };

    let mut client = Client::builder(&token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await
        .map_err(|e| format!("Failed to create Discord client: {}", e))?;

    log::info!("Discord: Client created successfully");

    client
        .start()
        .await
        .map_err(|e| format!("Discord client error: {}", e))
}
