//! Notes: note, notes, delnote, findnote, clearnotes

use super::{reply, usage, HandlerResult, Invocation, Reply};
use crate::context::BotContext;
use crate::models::Note;
use chrono::Utc;

const MAX_NOTE_CHARS: usize = 1000;
const MAX_NOTES_PER_USER: usize = 200;

fn render(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|n| {
            format!(
                "`#{}` {} • {}",
                n.id,
                n.created_at.format("%Y-%m-%d"),
                n.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn add(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let content = inv.args.trim();
    if content.is_empty() {
        return usage(ctx, "note <text>");
    }
    if content.chars().count() > MAX_NOTE_CHARS {
        return reply(format!("❌ Notes are limited to {MAX_NOTE_CHARS} characters."));
    }

    let existing = ctx.database.get_user_notes(inv.user_id).await?;
    if existing.len() >= MAX_NOTES_PER_USER {
        return reply(format!(
            "❌ You already have {MAX_NOTES_PER_USER} notes. Delete some with `{}delnote`.",
            ctx.config.command_prefix
        ));
    }

    let id = ctx.database.add_note(inv.user_id, content, Utc::now()).await?;
    reply(format!("📝 Saved note `#{id}`."))
}

pub async fn list(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let notes = ctx.database.get_user_notes(inv.user_id).await?;
    if notes.is_empty() {
        return reply(format!(
            "You have no notes yet. Add one with `{}note <text>`.",
            ctx.config.command_prefix
        ));
    }

    Ok(Some(
        Reply::text(format!("📒 **Your notes ({})**\n{}", notes.len(), render(&notes)))
            .with_button("🗑️ Clear all", "clearnotes:confirm"),
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
        return usage(ctx, "delnote <id>");
    };

    if ctx.database.delete_note(inv.user_id, id).await? {
        reply(format!("🗑️ Deleted note `#{id}`."))
    } else {
        reply(format!("❌ You have no note `#{id}`."))
    }
}

pub async fn find(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let query = inv.args.trim();
    if query.is_empty() {
        return usage(ctx, "findnote <text>");
    }

    let notes = ctx.database.search_notes(inv.user_id, query).await?;
    if notes.is_empty() {
        return reply(format!("🔍 No notes matching \"{query}\"."));
    }
    reply(format!(
        "🔍 **{} matching note(s)**\n{}",
        notes.len(),
        render(&notes)
    ))
}

pub async fn clear(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let removed = ctx.database.clear_notes(inv.user_id).await?;
    reply(format!("🗑️ Deleted {removed} note(s)."))
}
