//! Turns inbound chat events into handler calls.
//!
//! Text starting with the command prefix is looked up in the registry;
//! plain private text goes to the AI chat; button presses go to the
//! callback table. Every handler runs inside [`guard::contain`], so a
//! failing command costs the user a generic error message and nothing more.

use crate::commands::{ai, callbacks, Invocation, Reply};
use crate::context::BotContext;
use crate::guard;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::Arc;

pub const GENERIC_ERROR: &str = "⚠️ An error occurred while processing your request.";
pub const MAINTENANCE_NOTICE: &str =
    "🔧 The bot is under maintenance right now. Please try again later.";
pub const ADMIN_ONLY: &str = "⛔ This command is for admins only.";

/// A chat event as the router sees it, detached from the gateway types
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Text {
        user_id: u64,
        user_name: String,
        channel_id: u64,
        is_private: bool,
        text: String,
        sent_at: DateTime<Utc>,
    },
    Button {
        user_id: u64,
        user_name: String,
        channel_id: u64,
        is_private: bool,
        payload: String,
        sent_at: DateTime<Utc>,
    },
}

/// Keyword and trimmed arguments of a prefixed message
pub fn parse_command<'a>(prefix: &str, text: &'a str) -> Option<(&'a str, &'a str)> {
    let body = text.trim_start().strip_prefix(prefix)?;
    if body.is_empty() || body.starts_with(char::is_whitespace) {
        return None;
    }
    match body.split_once(char::is_whitespace) {
        Some((keyword, rest)) => Some((keyword, rest.trim())),
        None => Some((body.trim_end(), "")),
    }
}

pub struct Router {
    ctx: Arc<BotContext>,
}

impl Router {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Router { ctx }
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    /// Route one event; `None` means nothing should be sent back
    pub async fn route(&self, event: InboundEvent) -> Option<Reply> {
        match event {
            InboundEvent::Text {
                user_id,
                user_name,
                channel_id,
                is_private,
                text,
                sent_at,
            } => {
                if self.predates_startup(sent_at) {
                    debug!("Discarding message from {user_id} sent before startup");
                    return None;
                }

                let inv = Invocation {
                    user_id,
                    user_name,
                    channel_id,
                    is_private,
                    command: String::new(),
                    args: String::new(),
                };

                match parse_command(&self.ctx.config.command_prefix, &text) {
                    Some((keyword, args)) => self.run_command(inv.redirect(keyword, args)).await,
                    None if is_private => self.run_chat(inv.redirect("", text.trim())).await,
                    None => None,
                }
            }
            InboundEvent::Button {
                user_id,
                user_name,
                channel_id,
                is_private,
                payload,
                sent_at,
            } => {
                if self.predates_startup(sent_at) {
                    debug!("Discarding button '{payload}' from {user_id} pressed before startup");
                    return None;
                }

                let inv = Invocation {
                    user_id,
                    user_name,
                    channel_id,
                    is_private,
                    command: String::new(),
                    args: String::new(),
                };
                self.run_button(inv, &payload).await
            }
        }
    }

    /// Gateway timestamps only carry whole seconds
    fn predates_startup(&self, sent_at: DateTime<Utc>) -> bool {
        sent_at.timestamp() < self.ctx.started_at.timestamp()
    }

    async fn run_command(&self, inv: Invocation) -> Option<Reply> {
        let ctx: &BotContext = &self.ctx;
        let Some(spec) = ctx.registry.get(&inv.command) else {
            debug!("Unknown command '{}' from {}", inv.command, inv.user_id);
            return Some(Reply::text(format!(
                "❓ Unknown command `{p}{}`. Type `{p}help` to see what I can do.",
                inv.command,
                p = ctx.config.command_prefix
            )));
        };

        ctx.users.touch(inv.user_id, &inv.user_name, Utc::now());

        let is_admin = ctx.is_admin(inv.user_id);
        if spec.admin_only && !is_admin {
            return Some(Reply::text(ADMIN_ONLY));
        }
        if !is_admin && self.maintenance_enabled().await {
            return Some(Reply::text(MAINTENANCE_NOTICE));
        }

        debug!("Running '{}' for {}", spec.name, inv.user_id);
        let label = format!("command '{}'", spec.name);
        let outcome = guard::contain(&label, (spec.handler)(ctx, &inv)).await;

        ctx.users.record_command(inv.user_id);
        if let Err(e) = ctx.database.log_usage(inv.user_id, spec.name).await {
            warn!("Failed to log usage of '{}': {:#}", spec.name, e);
        }

        outcome.unwrap_or_else(|| Some(Reply::text(GENERIC_ERROR)))
    }

    async fn run_chat(&self, inv: Invocation) -> Option<Reply> {
        let ctx: &BotContext = &self.ctx;
        ctx.users.touch(inv.user_id, &inv.user_name, Utc::now());

        if !ctx.is_admin(inv.user_id) && self.maintenance_enabled().await {
            return Some(Reply::text(MAINTENANCE_NOTICE));
        }

        guard::contain("AI chat", ai::chat(ctx, &inv))
            .await
            .unwrap_or_else(|| Some(Reply::text(GENERIC_ERROR)))
    }

    async fn run_button(&self, inv: Invocation, payload: &str) -> Option<Reply> {
        let ctx: &BotContext = &self.ctx;
        ctx.users.touch(inv.user_id, &inv.user_name, Utc::now());

        if !ctx.is_admin(inv.user_id) && self.maintenance_enabled().await {
            return Some(Reply::text(MAINTENANCE_NOTICE));
        }

        debug!("Button '{}' pressed by {}", payload, inv.user_id);
        let label = format!("button '{payload}'");
        guard::contain(&label, callbacks::handle(ctx, &inv, payload))
            .await
            .unwrap_or_else(|| Some(Reply::text(GENERIC_ERROR)))
    }

    /// A settings read failure leaves the bot usable
    async fn maintenance_enabled(&self) -> bool {
        match self.ctx.maintenance_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!("Failed to read maintenance flag: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("!", "!help"), Some(("help", "")));
        assert_eq!(parse_command("!", "!note  buy milk "), Some(("note", "buy milk")));
        assert_eq!(parse_command("!", "  !coin"), Some(("coin", "")));
        assert_eq!(parse_command("!", "! help"), None);
        assert_eq!(parse_command("!", "!"), None);
        assert_eq!(parse_command("!", "hello"), None);
        assert_eq!(parse_command("bot.", "bot.dice 20"), Some(("dice", "20")));
    }
}
