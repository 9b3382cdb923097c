//! # Feature: Profiles & Ranks
//!
//! Every command earns a point; points map to rank titles and a leaderboard
//! position. VIPs get a longer AI memory.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Nicknames
//! - 1.0.0: Initial release

use super::{reply, HandlerResult, Invocation};
use crate::context::BotContext;
use crate::system_info;
use crate::users::{next_rank, rank_title};

const MAX_NICKNAME_CHARS: usize = 32;

pub async fn rank(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let Some(user) = ctx.users.get(inv.user_id) else {
        return reply("You are not registered yet.");
    };
    let position = ctx.users.position(inv.user_id).unwrap_or(0);

    let mut content = format!(
        "🏆 **{}**\nPoints: **{}**\nRank: {}\nLeaderboard: #{} of {}",
        user.display_name(),
        user.points,
        rank_title(user.points),
        position,
        ctx.users.len()
    );
    match next_rank(user.points) {
        Some((needed, title)) => content.push_str(&format!("\n{needed} more points to {title}")),
        None => content.push_str("\nTop rank reached!"),
    }
    reply(content)
}

pub async fn profile(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let Some(user) = ctx.users.get(inv.user_id) else {
        return reply("You are not registered yet.");
    };

    reply(format!(
        "👤 **{}**\n\
         Nickname: {}\n\
         Role: {}\n\
         Points: {} ({})\n\
         Language: `{}`\n\
         Member since: {}\n\
         Commands used: {}",
        user.name,
        user.nickname.as_deref().unwrap_or("-"),
        ctx.role_of(inv.user_id),
        user.points,
        rank_title(user.points),
        user.language,
        user.registered_at.format("%Y-%m-%d"),
        user.command_count,
    ))
}

pub async fn stats(ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    let stats = ctx.database.get_stats().await?;
    // The directory is ahead of the table until the next autosave
    let users = ctx.users.all();
    let vips = users
        .iter()
        .filter(|u| u.role.is_vip() || ctx.config.is_admin(u.id))
        .count();

    reply(format!(
        "📊 **Statistics**\n\
         Users: {}\n\
         VIPs: {}\n\
         Notes: {}\n\
         Memory entries: {}\n\
         Pending reminders: {}\n\
         Commands run: {}\n\
         Uptime: {}",
        users.len(),
        vips,
        stats.notes,
        stats.memory_entries,
        stats.pending_reminders,
        stats.commands_run,
        system_info::format_uptime(ctx.uptime()),
    ))
}

pub async fn vip(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let perks = format!(
        "• AI remembers {} messages instead of {}\n• A ⭐ next to your name",
        ctx.config.vip_history_limit, ctx.config.history_limit
    );

    if ctx.role_of(inv.user_id).is_vip() {
        reply(format!("⭐ You are a VIP. Your perks:\n{perks}"))
    } else {
        reply(format!(
            "You are not a VIP yet. VIP is granted by an admin and includes:\n{perks}"
        ))
    }
}

pub async fn nickname(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let name = inv.args.trim();
    if name.chars().count() > MAX_NICKNAME_CHARS {
        return reply(format!("❌ Nicknames are limited to {MAX_NICKNAME_CHARS} characters."));
    }

    let nickname = (!name.is_empty()).then(|| name.to_string());
    ctx.users.update(inv.user_id, |user| user.nickname = nickname.clone());

    match nickname {
        Some(n) => reply(format!("✏️ I'll call you **{n}** from now on.")),
        None => reply("✏️ Nickname cleared."),
    }
}
