//! Lookups backed by external services: weather, currency, translate, language

use super::{reply, usage, HandlerResult, Invocation};
use crate::calc;
use crate::context::BotContext;

fn is_language_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

pub async fn weather(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let city = inv.args.trim();
    if city.is_empty() {
        return usage(ctx, "weather <city>");
    }
    let summary = ctx.services.weather(city).await?;
    reply(format!("🌦️ {summary}"))
}

pub async fn currency(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let args = inv.arg_list();
    let [amount, from, to] = args.as_slice() else {
        return usage(ctx, "currency <amount> <FROM> <TO>");
    };
    let Some(amount) = amount
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a >= 0.0)
    else {
        return reply(format!("❌ `{amount}` is not a valid amount."));
    };
    if !is_currency_code(from) || !is_currency_code(to) {
        return reply("❌ Currencies are three-letter codes like `USD` or `EUR`.");
    }

    let from = from.to_uppercase();
    let to = to.to_uppercase();
    let converted = ctx.services.convert_currency(amount, &from, &to).await?;
    reply(format!(
        "💱 {} {from} = **{:.2} {to}**",
        calc::format_number(amount),
        converted
    ))
}

pub async fn translate(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let Some((lang, text)) = inv.split_first_arg().filter(|(_, t)| !t.is_empty()) else {
        return usage(ctx, "translate <lang> <text>");
    };
    if !is_language_code(lang) {
        return reply("❌ Use a two-letter language code like `de` or `es`.");
    }

    let lang = lang.to_lowercase();
    let translated = ctx.services.translate(text, &lang).await?;
    reply(format!("🌍 ({lang}) {translated}"))
}

pub async fn language(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let code = inv.args.trim().to_lowercase();
    if code.is_empty() {
        let current = ctx
            .users
            .get(inv.user_id)
            .map(|u| u.language)
            .unwrap_or_else(|| "en".to_string());
        return reply(format!("🌍 Your language is `{current}`."));
    }
    if !is_language_code(&code) {
        return usage(ctx, "language [two-letter code]");
    }

    ctx.users.update(inv.user_id, |user| user.language = code.clone());
    reply(format!("🌍 Language set to `{code}`."))
}
