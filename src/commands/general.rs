//! General commands: start, help, info, status, uptime, time, date

use super::{reply, HandlerResult, Invocation, Reply};
use crate::context::BotContext;
use crate::system_info;
use chrono::Utc;

pub async fn start(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let p = &ctx.config.command_prefix;
    let content = format!(
        "👋 Hi **{}**! I'm your all-round helper.\n\n\
         📝 Notes and memory: `{p}note`, `{p}memorysave`\n\
         ⏰ Reminders: `{p}remind 10m Call mom`\n\
         🤖 AI chat: `{p}ai` (or just DM me)\n\
         🎲 Fun: `{p}joke`, `{p}quiz`, `{p}8ball`\n\
         🌦️ Lookups: `{p}weather`, `{p}currency`, `{p}translate`\n\n\
         Type `{p}help` for everything.",
        inv.user_name
    );

    Ok(Some(
        Reply::text(content)
            .with_button("📖 Help", "help")
            .with_button("👤 Profile", "profile")
            .with_button("😂 Joke", "joke"),
    ))
}

pub async fn help(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let is_admin = ctx.is_admin(inv.user_id);
    let p = &ctx.config.command_prefix;

    let mut lines = vec!["**Available commands**".to_string()];
    for spec in ctx.registry.iter() {
        if spec.admin_only && !is_admin {
            continue;
        }
        let marker = if spec.admin_only { " 🛡️" } else { "" };
        lines.push(format!("`{p}{}` - {}{marker}", spec.usage, spec.description));
    }

    reply(lines.join("\n"))
}

pub async fn info(_ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    let mut content = format!(
        "🤖 **{}**\nRust {} • {}",
        system_info::bot_version(),
        system_info::rust_version(),
        system_info::build_target(),
    );

    let commits = system_info::recent_commits();
    if !commits.is_empty() {
        content.push_str("\n\n**Recent changes**");
        for (hash, subject) in commits {
            content.push_str(&format!("\n`{hash}` {subject}"));
        }
    }

    reply(content)
}

pub async fn status(ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    let memory = system_info::memory_usage();
    let maintenance = if ctx.maintenance_enabled().await? {
        "🔧 on"
    } else {
        "off"
    };

    reply(format!(
        "🟢 **Status**\n\
         Uptime: {}\n\
         Users: {}\n\
         Memory: {} / {} MB ({:.1}%)\n\
         Host: {}\n\
         Maintenance: {}",
        system_info::format_uptime(ctx.uptime()),
        ctx.users.len(),
        memory.used_mb,
        memory.total_mb,
        memory.percent(),
        system_info::host_os(),
        maintenance,
    ))
}

pub async fn uptime(ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    reply(format!(
        "⏱️ Up for {} (since {})",
        system_info::format_uptime(ctx.uptime()),
        ctx.started_at.format("%Y-%m-%d %H:%M UTC")
    ))
}

pub async fn time(_ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    reply(format!("🕒 {}", Utc::now().format("%H:%M:%S UTC")))
}

pub async fn date(_ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    reply(format!("📅 {}", Utc::now().format("%A, %d %B %Y")))
}
