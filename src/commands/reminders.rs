//! Reminders: remind, reminders, delreminder. Delivery happens in the
//! reminder-check job.

use super::{reply, usage, HandlerResult, Invocation};
use crate::context::BotContext;
use crate::timeparse::{format_duration, parse_duration};
use chrono::Utc;

const MAX_REMINDER_CHARS: usize = 500;
const MAX_PENDING_PER_USER: usize = 50;

pub async fn remind(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let Some((raw_duration, text)) = inv.split_first_arg().filter(|(_, t)| !t.is_empty()) else {
        return usage(ctx, "remind <10m|2h|1d> <text>");
    };
    let Some(delay) = parse_duration(raw_duration) else {
        return reply(format!(
            "❌ `{raw_duration}` is not a valid duration. Use e.g. `30s`, `10m`, `1h30m`, `2d` (max 365d)."
        ));
    };
    if text.chars().count() > MAX_REMINDER_CHARS {
        return reply(format!("❌ Reminders are limited to {MAX_REMINDER_CHARS} characters."));
    }

    let pending = ctx.database.get_user_reminders(inv.user_id).await?;
    if pending.len() >= MAX_PENDING_PER_USER {
        return reply(format!(
            "❌ You already have {MAX_PENDING_PER_USER} pending reminders."
        ));
    }

    let now = Utc::now();
    let due_at = now + delay;
    let id = ctx
        .database
        .add_reminder(inv.user_id, inv.channel_id, text, due_at, now)
        .await?;

    reply(format!(
        "⏰ Reminder `#{id}` set for {} (in {}).",
        due_at.format("%Y-%m-%d %H:%M:%S UTC"),
        format_duration(delay)
    ))
}

pub async fn list(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let reminders = ctx.database.get_user_reminders(inv.user_id).await?;
    if reminders.is_empty() {
        return reply("⏰ You have no pending reminders.");
    }

    let now = Utc::now();
    let lines: Vec<String> = reminders
        .iter()
        .map(|r| {
            format!(
                "`#{}` {} (in {}) • {}",
                r.id,
                r.due_at.format("%Y-%m-%d %H:%M UTC"),
                format_duration(r.due_at - now),
                r.text
            )
        })
        .collect();
    reply(format!(
        "⏰ **Pending reminders ({})**\n{}",
        reminders.len(),
        lines.join("\n")
    ))
}

pub async fn delete(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let Some(id) = inv
        .args
        .trim()
        .trim_start_matches('#')
        .parse::<i64>()
        .ok()
    else {
        return usage(ctx, "delreminder <id>");
    };

    if ctx.database.delete_reminder(inv.user_id, id).await? {
        reply(format!("🗑️ Deleted reminder `#{id}`."))
    } else {
        reply(format!("❌ You have no reminder `#{id}`."))
    }
}
