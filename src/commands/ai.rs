//! # Feature: AI Chat
//!
//! `!ai` and free text in DMs go to the chat completion service with the
//! sender's recent conversation as context.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Explain when no chat backend is configured
//! - 1.1.0: VIPs keep a longer history
//! - 1.0.0: Initial release

use super::{reply, usage, HandlerResult, Invocation};
use crate::context::BotContext;
use crate::models::ChatTurn;
use log::debug;

/// Longest prompt forwarded to the model
const MAX_PROMPT_CHARS: usize = 4000;

pub const AI_NOT_CONFIGURED: &str =
    "🤖 AI chat is not configured on this bot. Ask the owner to set `OPENAI_API_KEY`.";

pub async fn ask(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let prompt = inv.args.trim();
    if prompt.is_empty() {
        return usage(ctx, "ai <question>");
    }
    converse(ctx, inv.user_id, prompt).await
}

/// Default handler for plain private messages
pub async fn chat(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let prompt = inv.args.trim();
    if prompt.is_empty() {
        return Ok(None);
    }
    converse(ctx, inv.user_id, prompt).await
}

async fn converse(ctx: &BotContext, user_id: u64, prompt: &str) -> HandlerResult {
    if !ctx.services.chat_available() {
        return reply(AI_NOT_CONFIGURED);
    }
    let prompt: String = prompt.chars().take(MAX_PROMPT_CHARS).collect();

    let mut messages = vec![ChatTurn::system(ctx.config.system_prompt.clone())];
    messages.extend(ctx.history.get(user_id));
    messages.push(ChatTurn::user(prompt.clone()));

    debug!("AI request for user {} with {} messages", user_id, messages.len());
    let answer = ctx.services.chat(&messages).await?;

    // Only a completed exchange lands in the history
    let limit = ctx.history_limit(user_id);
    ctx.history.push(user_id, ChatTurn::user(prompt), limit);
    ctx.history.push(user_id, ChatTurn::assistant(answer.clone()), limit);

    reply(answer)
}

pub async fn clear_history(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let dropped = ctx.history.clear(inv.user_id);
    if dropped == 0 {
        reply("🧹 There was no conversation to forget.")
    } else {
        reply(format!("🧹 Forgot {dropped} messages of our conversation."))
    }
}
