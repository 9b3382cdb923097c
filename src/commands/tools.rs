//! Tools: math/calculate, password, qr, shorturl, ip

use super::{reply, usage, HandlerResult, Invocation};
use crate::calc;
use crate::context::BotContext;
use crate::services;
use rand::seq::IndexedRandom;

const DEFAULT_PASSWORD_LEN: usize = 16;
const PASSWORD_LEN_RANGE: std::ops::RangeInclusive<usize> = 8..=64;
const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{}?";

pub async fn calculate(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let expression = inv.args.trim();
    if expression.is_empty() {
        return usage(ctx, &format!("{} <expression>", inv.command));
    }

    match calc::evaluate(expression) {
        Ok(value) => reply(format!("🧮 `{expression}` = **{}**", calc::format_number(value))),
        Err(e) => reply(format!("❌ Could not evaluate `{expression}`: {e}")),
    }
}

fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| PASSWORD_CHARSET.choose(&mut rng))
        .map(|&b| b as char)
        .collect()
}

pub async fn password(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let length = match inv.args.trim() {
        "" => DEFAULT_PASSWORD_LEN,
        raw => match raw.parse::<usize>() {
            Ok(n) if PASSWORD_LEN_RANGE.contains(&n) => n,
            _ => return usage(ctx, "password [length 8-64]"),
        },
    };

    let secret = generate_password(length);
    let mut content = format!("🔐 `{secret}`");
    if !inv.is_private {
        content.push_str("\n⚠️ Generated in a public channel; ask me in a DM for anything important.");
    }
    reply(content)
}

pub async fn qr(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let text = inv.args.trim();
    if text.is_empty() {
        return usage(ctx, "qr <text>");
    }
    reply(format!("🔳 {}", services::qr_code_url(text)?))
}

pub async fn short_url(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let url = inv.args.trim();
    if url.is_empty() {
        return usage(ctx, "shorturl <url>");
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return reply("❌ Only http:// and https:// links can be shortened.");
    }

    let short = ctx.services.shorten_url(url).await?;
    reply(format!("🔗 {short}"))
}

pub async fn ip(ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    let address = ctx.services.public_ip().await?;
    reply(format!("🌐 Public IP: `{address}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password_length_and_charset() {
        let secret = generate_password(24);
        assert_eq!(secret.chars().count(), 24);
        assert!(secret.bytes().all(|b| PASSWORD_CHARSET.contains(&b)));
    }
}
