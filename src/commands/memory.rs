//! Memory: memorysave, memoryget, memorylist, memorydel

use super::{reply, usage, HandlerResult, Invocation};
use crate::context::BotContext;
use chrono::Utc;

const MAX_KEY_CHARS: usize = 50;
const MAX_VALUE_CHARS: usize = 1000;

/// Keys are case-insensitive
fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub async fn save(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let Some((key, value)) = inv.split_first_arg().filter(|(_, v)| !v.is_empty()) else {
        return usage(ctx, "memorysave <key> <value>");
    };
    if key.chars().count() > MAX_KEY_CHARS || value.chars().count() > MAX_VALUE_CHARS {
        return reply(format!(
            "❌ Keys are limited to {MAX_KEY_CHARS} and values to {MAX_VALUE_CHARS} characters."
        ));
    }

    let key = normalize_key(key);
    ctx.database
        .save_memory(inv.user_id, &key, value, Utc::now())
        .await?;
    reply(format!("🧠 Remembered **{key}**."))
}

pub async fn get(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let key = normalize_key(&inv.args);
    if key.is_empty() {
        return usage(ctx, "memoryget <key>");
    }

    match ctx.database.get_memory(inv.user_id, &key).await? {
        Some(value) => reply(format!("🧠 **{key}**: {value}")),
        None => reply(format!("❓ Nothing saved under **{key}**.")),
    }
}

pub async fn list(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let entries = ctx.database.list_memory(inv.user_id).await?;
    if entries.is_empty() {
        return reply("🧠 Your memory is empty.");
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|e| format!("• **{}**: {}", e.key, e.value))
        .collect();
    reply(format!("🧠 **Your memory ({})**\n{}", entries.len(), lines.join("\n")))
}

pub async fn delete(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let key = normalize_key(&inv.args);
    if key.is_empty() {
        return usage(ctx, "memorydel <key>");
    }

    if ctx.database.delete_memory(inv.user_id, &key).await? {
        reply(format!("🗑️ Forgot **{key}**."))
    } else {
        reply(format!("❓ Nothing saved under **{key}**."))
    }
}
