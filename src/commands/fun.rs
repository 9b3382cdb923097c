//! # Feature: Fun
//!
//! Jokes, facts, quotes, trivia quiz, coin, dice and the magic 8-ball.
//! Content is built in; nothing here calls out to the network.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Quiz answers award points once per question
//! - 1.1.0: "Another one" buttons
//! - 1.0.0: Initial release

use super::{reply, usage, HandlerResult, Invocation, Reply};
use crate::context::BotContext;
use rand::seq::IndexedRandom;
use rand::Rng;

pub const QUIZ_POINTS: i64 = 5;

const JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "I told my computer I needed a break, and it said: \"No problem, I'll go to sleep.\"",
    "Why did the developer go broke? Because he used up all his cache.",
    "There are 10 types of people: those who understand binary and those who don't.",
    "A SQL query walks into a bar, walks up to two tables and asks: \"Can I join you?\"",
    "Why was the math book sad? It had too many problems.",
    "I would tell you a UDP joke, but you might not get it.",
    "Debugging: being the detective in a crime movie where you are also the murderer.",
];

const FACTS: &[&str] = &[
    "Honey never spoils; edible honey has been found in ancient Egyptian tombs.",
    "Octopuses have three hearts and blue blood.",
    "A day on Venus is longer than its year.",
    "Bananas are berries, but strawberries are not.",
    "The Eiffel Tower can be about 15 cm taller during summer due to thermal expansion.",
    "Wombat droppings are cube-shaped.",
    "The first computer bug was an actual moth found in a relay in 1947.",
    "Sharks existed before trees.",
];

const QUOTES: &[&str] = &[
    "\"Simplicity is prerequisite for reliability.\" — Edsger W. Dijkstra",
    "\"The best way to predict the future is to invent it.\" — Alan Kay",
    "\"Talk is cheap. Show me the code.\" — Linus Torvalds",
    "\"It always seems impossible until it's done.\" — Nelson Mandela",
    "\"Stay hungry, stay foolish.\" — Stewart Brand",
    "\"First, solve the problem. Then, write the code.\" — John Johnson",
    "\"Do or do not. There is no try.\" — Yoda",
];

const EIGHT_BALL: &[&str] = &[
    "It is certain.",
    "Without a doubt.",
    "You may rely on it.",
    "Most likely.",
    "Outlook good.",
    "Reply hazy, try again.",
    "Ask again later.",
    "Cannot predict now.",
    "Don't count on it.",
    "My sources say no.",
    "Very doubtful.",
];

pub struct QuizQuestion {
    pub question: &'static str,
    pub choices: [&'static str; 4],
    pub answer: usize,
}

pub const QUIZ: &[QuizQuestion] = &[
    QuizQuestion {
        question: "What is the largest planet in our solar system?",
        choices: ["Earth", "Jupiter", "Saturn", "Neptune"],
        answer: 1,
    },
    QuizQuestion {
        question: "How many continents are there?",
        choices: ["5", "6", "7", "8"],
        answer: 2,
    },
    QuizQuestion {
        question: "Which element has the chemical symbol O?",
        choices: ["Gold", "Osmium", "Oxygen", "Iron"],
        answer: 2,
    },
    QuizQuestion {
        question: "In which year did the first person walk on the Moon?",
        choices: ["1965", "1969", "1972", "1959"],
        answer: 1,
    },
    QuizQuestion {
        question: "What is the fastest land animal?",
        choices: ["Cheetah", "Lion", "Pronghorn", "Greyhound"],
        answer: 0,
    },
    QuizQuestion {
        question: "How many bits are in a byte?",
        choices: ["4", "8", "16", "32"],
        answer: 1,
    },
    QuizQuestion {
        question: "Which ocean is the largest?",
        choices: ["Atlantic", "Indian", "Arctic", "Pacific"],
        answer: 3,
    },
];

fn pick(items: &[&'static str]) -> &'static str {
    items.choose(&mut rand::rng()).copied().unwrap_or_default()
}

pub async fn joke(_ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    Ok(Some(
        Reply::text(format!("😂 {}", pick(JOKES))).with_button("Another joke", "joke"),
    ))
}

pub async fn fact(_ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    Ok(Some(
        Reply::text(format!("💡 {}", pick(FACTS))).with_button("Another fact", "fact"),
    ))
}

pub async fn quote(_ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    Ok(Some(
        Reply::text(format!("📜 {}", pick(QUOTES))).with_button("Another quote", "quote"),
    ))
}

/// Question with one button per choice; payload `quiz:<question>:<choice>`
pub fn quiz_reply(index: usize) -> Option<Reply> {
    let question = QUIZ.get(index)?;
    let mut reply = Reply::text(format!("❓ **Quiz**\n{}", question.question));
    for (i, choice) in question.choices.iter().enumerate() {
        reply = reply.with_button(*choice, format!("quiz:{index}:{i}"));
    }
    Some(reply)
}

pub async fn quiz(_ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    let index = rand::rng().random_range(0..QUIZ.len());
    Ok(quiz_reply(index))
}

/// Grade a quiz answer; points are only awarded for the first correct answer
pub async fn answer_quiz(
    ctx: &BotContext,
    inv: &Invocation,
    question_index: usize,
    choice: usize,
) -> HandlerResult {
    let Some(question) = QUIZ.get(question_index) else {
        return reply("⌛ That quiz has expired.");
    };
    let Some(chosen) = question.choices.get(choice) else {
        return reply("⌛ That quiz has expired.");
    };

    let correct = question.choices[question.answer];
    if choice != question.answer {
        return Ok(Some(
            Reply::text(format!("❌ **{chosen}** is wrong. The answer was **{correct}**."))
                .with_button("Next question", "quiz"),
        ));
    }

    let first_time = ctx.answered_quizzes.insert((inv.user_id, question_index));
    let content = if first_time {
        let total = ctx.users.add_points(inv.user_id, QUIZ_POINTS).unwrap_or(0);
        format!("✅ **{correct}** is right! +{QUIZ_POINTS} points ({total} total)")
    } else {
        format!("✅ **{correct}** is right! (already answered, no extra points)")
    };
    Ok(Some(Reply::text(content).with_button("Next question", "quiz")))
}

pub async fn coin(_ctx: &BotContext, _inv: &Invocation) -> HandlerResult {
    let side = if rand::rng().random_bool(0.5) {
        "Heads"
    } else {
        "Tails"
    };
    reply(format!("🪙 {side}!"))
}

pub async fn dice(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let sides = match inv.args.trim() {
        "" => 6,
        raw => match raw.parse::<u32>() {
            Ok(n) if (2..=1000).contains(&n) => n,
            _ => return usage(ctx, "dice [sides 2-1000]"),
        },
    };
    let roll = rand::rng().random_range(1..=sides);
    reply(format!("🎲 You rolled **{roll}** (d{sides})"))
}

pub async fn eight_ball(ctx: &BotContext, inv: &Invocation) -> HandlerResult {
    let question = inv.args.trim();
    if question.is_empty() {
        return usage(ctx, "8ball <question>");
    }
    reply(format!("🎱 *{question}*\n{}", pick(EIGHT_BALL)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_bank_is_consistent() {
        for question in QUIZ {
            assert!(question.answer < question.choices.len());
        }
    }

    #[test]
    fn test_quiz_reply_buttons() {
        let reply = quiz_reply(0).unwrap();
        assert_eq!(reply.buttons.len(), 4);
        assert_eq!(reply.buttons[1].payload, "quiz:0:1");
        assert!(quiz_reply(QUIZ.len()).is_none());
    }
}
