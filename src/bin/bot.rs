//! Discord gateway entry point
//!
//! Loads configuration, opens the database, starts the health endpoint and
//! the job runner, then hands every inbound message and button press to the
//! router. Configuration comes from config.yaml or environment variables.

use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::builder::CreateComponents;
use serenity::http::Http;
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

use helper_bot::commands::{Button, Reply};
use helper_bot::config::Config;
use helper_bot::context::BotContext;
use helper_bot::database::Database;
use helper_bot::health;
use helper_bot::jobs::{self, JobRunner};
use helper_bot::notifier::{restrict_mentions, split_message, DiscordNotifier, MESSAGE_LIMIT};
use helper_bot::router::{InboundEvent, Router};
use helper_bot::services::HttpServices;

/// Discord allows five buttons per row and five rows per message
const BUTTONS_PER_ROW: usize = 5;
const MAX_BUTTONS: usize = 25;

fn add_buttons<'a>(components: &'a mut CreateComponents, buttons: &[Button]) -> &'a mut CreateComponents {
    for row in buttons[..buttons.len().min(MAX_BUTTONS)].chunks(BUTTONS_PER_ROW) {
        components.create_action_row(|action_row| {
            for button in row {
                action_row.create_button(|b| {
                    b.custom_id(&button.payload)
                        .label(&button.label)
                        .style(ButtonStyle::Primary)
                });
            }
            action_row
        });
    }
    components
}

struct Handler {
    router: Arc<Router>,
}

impl Handler {
    /// Send a reply as one or more messages; buttons ride on the last chunk
    async fn send_reply(&self, ctx: &Context, msg: &Message, reply: Reply) -> Result<()> {
        let chunks = split_message(&reply.content, MESSAGE_LIMIT);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.into_iter().enumerate() {
            let buttons: &[Button] = if i == last { &reply.buttons } else { &[] };
            msg.channel_id
                .send_message(&ctx.http, |m| {
                    m.content(chunk)
                        .allowed_mentions(|am| restrict_mentions(am, None));
                    if !buttons.is_empty() {
                        m.components(|c| add_buttons(c, buttons));
                    }
                    m
                })
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let sent_at = chrono::DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or_else(chrono::Utc::now);
        let event = InboundEvent::Text {
            user_id: msg.author.id.0,
            user_name: msg.author.name.clone(),
            channel_id: msg.channel_id.0,
            is_private: msg.guild_id.is_none(),
            text: msg.content.clone(),
            sent_at,
        };

        let Some(reply) = self.router.route(event).await else {
            return;
        };

        if let Err(e) = self.send_reply(&ctx, &msg, reply).await {
            warn!("Failed to send reply in channel {}: {:#}", msg.channel_id, e);
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("{} is connected and ready!", ready.user.name);
        info!("Connected to {} guilds", ready.guilds.len());
        info!("Bot ID: {}", ready.user.id);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::MessageComponent(component) = interaction else {
            debug!("Ignoring non-component interaction");
            return;
        };

        let event = InboundEvent::Button {
            user_id: component.user.id.0,
            user_name: component.user.name.clone(),
            channel_id: component.channel_id.0,
            is_private: component.guild_id.is_none(),
            payload: component.data.custom_id.clone(),
            sent_at: chrono::DateTime::from_timestamp(component.id.created_at().unix_timestamp(), 0)
                .unwrap_or_else(chrono::Utc::now),
        };

        let Some(reply) = self.router.route(event).await else {
            // Acknowledge so the client doesn't show "interaction failed"
            if let Err(e) = component
                .create_interaction_response(&ctx.http, |r| {
                    r.kind(InteractionResponseType::DeferredUpdateMessage)
                })
                .await
            {
                debug!("Failed to acknowledge button press: {}", e);
            }
            return;
        };

        let mut chunks = split_message(&reply.content, MESSAGE_LIMIT).into_iter();
        let first = chunks.next().unwrap_or_default();
        let followups: Vec<String> = chunks.collect();
        let first_buttons: &[Button] = if followups.is_empty() { &reply.buttons } else { &[] };

        if let Err(e) = component
            .create_interaction_response(&ctx.http, |r| {
                r.kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|d| {
                        d.content(first)
                            .allowed_mentions(|am| restrict_mentions(am, None));
                        if !first_buttons.is_empty() {
                            d.components(|c| add_buttons(c, first_buttons));
                        }
                        d
                    })
            })
            .await
        {
            warn!("Failed to answer button '{}': {}", component.data.custom_id, e);
            return;
        }

        let last = followups.len().saturating_sub(1);
        for (i, chunk) in followups.into_iter().enumerate() {
            let buttons: &[Button] = if i == last { &reply.buttons } else { &[] };
            if let Err(e) = component
                .create_followup_message(&ctx.http, |f| {
                    f.content(chunk)
                        .allowed_mentions(|am| restrict_mentions(am, None));
                    if !buttons.is_empty() {
                        f.components(|c| add_buttons(c, buttons));
                    }
                    f
                })
                .await
            {
                warn!("Failed to send follow-up for button '{}': {}", component.data.custom_id, e);
                return;
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = match Config::auto_load() {
        Ok(config) => config,
        Err(e) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
            error!("Configuration error: {e:#}");
            std::process::exit(1);
        }
    };

    // Set up logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting helper bot v{}...", env!("CARGO_PKG_VERSION"));

    let database = Database::new(&config.database_path).await?;
    let services = Arc::new(HttpServices::new(&config)?);
    let http = Arc::new(Http::new(&config.discord_token));
    let notifier = Arc::new(DiscordNotifier::new(http));

    let token = config.discord_token.clone();
    let health_port = config.health_port;
    let ctx = Arc::new(BotContext::new(config, database, services, notifier).await?);
    info!("Registered {} commands", ctx.registry.len());

    if let Some(port) = health_port {
        let health_ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = health::serve(health_ctx, port).await {
                error!("Health endpoint failed: {e:#}");
            }
        });
    }

    JobRunner::standard().spawn(ctx.clone());

    let handler = Handler {
        router: Arc::new(Router::new(ctx.clone())),
    };

    // Configure gateway intents
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Connecting to Discord gateway...");

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                error!("Gateway connection failed: {e}");
            }
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Received Ctrl+C, shutting down..."),
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
        }
    }

    // Best-effort final save; anything lost here is at most one autosave period
    if let Err(e) = jobs::autosave(ctx).await {
        error!("Final autosave failed: {e:#}");
    }

    info!("Bot stopped");
    Ok(())
}
