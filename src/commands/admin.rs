//! # Feature: Admin Commands
//!
//! Role management, broadcasts, maintenance mode and JSON backups.
//! Registered as admin-only; the router rejects everyone else before a
//! handler here runs.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Maintenance flag persisted in bot settings
//! - 1.1.0: Backups include reminders
//! - 1.0.0: Initial release

use super::{reply, usage, HandlerResult, Invocation};
use crate::context::{BotContext, MAINTENANCE_KEY};
use crate::models::Role;
use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const LEADERBOARD_SIZE: usize = 10;

/// Accepts a raw id or a Discord mention (`<@123>`, `<@!123>`)
fn parse_user_id(raw: &str) -> Option<u64> {
    raw.trim()
        .trim_start_matches("<@")
        .trim_start_matches('!')
        .trim_end_matches('>')
        .parse()
        .ok()
}

async fn change_role(ctx: &BotContext, inv: &Invocation, role: Role) -> HandlerResult {
    let Some(target) = parse_user_id(&inv.args) else {
        return usage(ctx, &format!("{} <user id>", inv.command));
    };
    let Some(user) = ctx.users.get(target) else {
        return reply(format!("❌ User `{target}` has never talked to me."));
    };
    if ctx.role_of(target) == Role::Admin {
        return reply(format!("❌ **{}** is an admin; their role can't be changed here.", user.name));
    }

    ctx.users.set_role(target, role);
    info!("User {} set role of {} to {}", inv.user_id, target, role.as_str());
    reply(format!("✅ **{}** is now {}.", user.name, role))
}

pub async fn grant_vip(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    change_role(ctx, inv, Role::Vip).await
}

pub async fn revoke_vip(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    change_role(ctx, inv, Role::Normal).await
}

pub async fn broadcast(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let text = inv.args.trim();
    if text.is_empty() {
        return usage(ctx, "broadcast <text>");
    }

    let message = format!("📢 **Announcement**\n{text}");
    let mut delivered = 0;
    let mut failed = 0;
    for user in ctx.users.all() {
        match ctx.notifier.send_to_user(user.id, &message).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!("Broadcast to {} failed: {:#}", user.id, e);
                failed += 1;
            }
        }
    }

    info!("Broadcast by {}: {} delivered, {} failed", inv.user_id, delivered, failed);
    reply(format!("📢 Broadcast sent: {delivered} delivered, {failed} failed."))
}

pub async fn users(ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    let leaderboard = ctx.users.leaderboard();
    let mut content = format!("👥 **{} users**", leaderboard.len());
    for (i, user) in leaderboard.iter().take(LEADERBOARD_SIZE).enumerate() {
        content.push_str(&format!(
            "\n{}. {} (`{}`) {} pts",
            i + 1,
            user.display_name(),
            user.id,
            user.points
        ));
    }
    reply(content)
}

pub async fn maintenance(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    match inv.args.trim() {
        "" => {
            let state = if ctx.maintenance_enabled().await? { "on" } else { "off" };
            reply(format!("🔧 Maintenance mode is **{state}**."))
        }
        state @ ("on" | "off") => {
            ctx.database.set_bot_setting(MAINTENANCE_KEY, state).await?;
            info!("Maintenance mode turned {} by {}", state, inv.user_id);
            reply(format!("🔧 Maintenance mode is now **{state}**."))
        }
        _ => usage(ctx, "maintenance [on|off]"),
    }
}

/// Flush pending user changes, then write every table to a fresh JSON file
pub async fn write_backup(ctx: &BotContext, dir: &Path) -> Result<PathBuf> {
    ctx.users.flush(&ctx.database).await?;

    let now = Utc::now();
    let snapshot = ctx.database.snapshot(now).await?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create backup directory {}", dir.display()))?;

    let short_id = Uuid::new_v4().simple().to_string();
    let file_name = format!("backup-{}-{}.json", now.format("%Y%m%dT%H%M%SZ"), &short_id[..8]);
    let path = dir.join(file_name);
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write backup {}", path.display()))?;

    info!(
        "Backup written to {} ({} users, {} notes, {} memory entries, {} reminders)",
        path.display(),
        snapshot.users.len(),
        snapshot.notes.len(),
        snapshot.memory.len(),
        snapshot.reminders.len()
    );
    Ok(path)
}

pub async fn backup(ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    let path = write_backup(ctx, Path::new(&ctx.config.backup_dir)).await?;
    reply(format!("💾 Backup written to `{}`.", path.display()))
}
