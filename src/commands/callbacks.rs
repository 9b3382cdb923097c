//! Button presses. Each payload maps onto the command that offered the button,
//! except quiz answers which carry their own question and choice.

use super::{fun, general, notes, profile, reply, HandlerResult, Invocation};
use crate::context::BotContext;

pub const EXPIRED: &str = "⌛ This button has expired. Try the command again.";

/// `quiz:<question>:<choice>`
fn parse_quiz_answer(payload: &str) -> Option<(usize, usize)> {
    let rest = payload.strip_prefix("quiz:")?;
    let (question, choice) = rest.split_once(':')?;
    Some((question.parse().ok()?, choice.parse().ok()?))
}

pub async fn handle(ctx: &BotContext, inv: &Invocation, payload: &str) -> HandlerResult {
    let as_command = |name: &str| inv.redirect(name, "");

    match payload {
        "help" => general::help(ctx, &as_command("help")).await,
        "profile" => profile::profile(ctx, &as_command("profile")).await,
        "joke" => fun::joke(ctx, &as_command("joke")).await,
        "fact" => fun::fact(ctx, &as_command("fact")).await,
        "quote" => fun::quote(ctx, &as_command("quote")).await,
        "quiz" => fun::quiz(ctx, &as_command("quiz")).await,
        "notes" => notes::list(ctx, &as_command("notes")).await,
        "clearnotes:confirm" => notes::clear(ctx, &as_command("clearnotes")).await,
        other => match parse_quiz_answer(other) {
            Some((question, choice)) => fun::answer_quiz(ctx, inv, question, choice).await,
            None => reply(EXPIRED),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quiz_answer() {
        assert_eq!(parse_quiz_answer("quiz:3:1"), Some((3, 1)));
        assert_eq!(parse_quiz_answer("quiz:3"), None);
        assert_eq!(parse_quiz_answer("quiz:x:1"), None);
        assert_eq!(parse_quiz_answer("joke"), None);
    }
}
