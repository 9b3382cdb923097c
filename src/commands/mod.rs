//! Command registry: the fixed keyword → handler table.
//!
//! Every handler has the same shape, takes the shared [`BotContext`] and the
//! parsed [`Invocation`], and returns an optional [`Reply`]. Adding a command
//! means writing the handler and adding one line to [`CommandRegistry::builtin`].

pub mod admin;
pub mod ai;
pub mod callbacks;
pub mod fun;
pub mod general;
pub mod lookup;
pub mod memory;
pub mod notes;
pub mod profile;
pub mod reminders;
pub mod tools;

use crate::context::BotContext;
use anyhow::Result;
use futures::future::BoxFuture;
use std::collections::HashMap;

/// `Ok(None)` means the handler deliberately sends nothing
pub type HandlerResult = Result<Option<Reply>>;

pub type HandlerFn = for<'a> fn(&'a BotContext, &'a Invocation) -> BoxFuture<'a, HandlerResult>;

/// One inbound command (or button press) after parsing
#[derive(Debug, Clone)]
pub struct Invocation {
    pub user_id: u64,
    pub user_name: String,
    pub channel_id: u64,
    pub is_private: bool,
    pub command: String,
    pub args: String,
}

impl Invocation {
    /// Whitespace separated arguments
    pub fn arg_list(&self) -> Vec<&str> {
        self.args.split_whitespace().collect()
    }

    /// First argument and the trimmed remainder
    pub fn split_first_arg(&self) -> Option<(&str, &str)> {
        let args = self.args.trim();
        if args.is_empty() {
            return None;
        }
        match args.split_once(char::is_whitespace) {
            Some((first, rest)) => Some((first, rest.trim())),
            None => Some((args, "")),
        }
    }

    /// Same sender and channel, different command
    pub fn redirect(&self, command: &str, args: &str) -> Invocation {
        Invocation {
            command: command.to_string(),
            args: args.to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply {
            content: content.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_button(mut self, label: impl Into<String>, payload: impl Into<String>) -> Self {
        self.buttons.push(Button {
            label: label.into(),
            payload: payload.into(),
        });
        self
    }
}

/// Shorthand for the common "reply with this text" result
pub fn reply(content: impl Into<String>) -> HandlerResult {
    Ok(Some(Reply::text(content)))
}

pub fn usage(ctx: &BotContext, usage_line: &str) -> HandlerResult {
    reply(format!("Usage: `{}{}`", ctx.config.command_prefix, usage_line))
}

pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub admin_only: bool,
    pub handler: HandlerFn,
}

macro_rules! command {
    (admin $name:literal, $usage:literal, $description:literal, $handler:path) => {
        CommandSpec {
            name: $name,
            usage: $usage,
            description: $description,
            admin_only: true,
            handler: command!(@handler $handler),
        }
    };
    ($name:literal, $usage:literal, $description:literal, $handler:path) => {
        CommandSpec {
            name: $name,
            usage: $usage,
            description: $description,
            admin_only: false,
            handler: command!(@handler $handler),
        }
    };
    (@handler $handler:path) => {{
        fn call<'a>(ctx: &'a BotContext, inv: &'a Invocation) -> BoxFuture<'a, HandlerResult> {
            futures::FutureExt::boxed($handler(ctx, inv))
        }
        call
    }};
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
    index: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: CommandSpec) -> Result<()> {
        if self.index.contains_key(spec.name) {
            anyhow::bail!("Command '{}' registered twice", spec.name);
        }
        self.index.insert(spec.name, self.commands.len());
        self.commands.push(spec);
        Ok(())
    }

    /// Exact, case-sensitive lookup
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.index.get(name).map(|&i| &self.commands[i])
    }

    /// Commands in registration order
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The full command surface, in the order `help` lists it
    pub fn builtin() -> Result<Self> {
        let specs = vec![
            // General
            command!("start", "start", "Register and see what I can do", general::start),
            command!("help", "help", "List all commands", general::help),
            command!("info", "info", "Version and build information", general::info),
            command!("status", "status", "Bot health and resource usage", general::status),
            command!("uptime", "uptime", "How long I have been running", general::uptime),
            command!("time", "time", "Current UTC time", general::time),
            command!("date", "date", "Today's date", general::date),
            // AI
            command!("ai", "ai <question>", "Ask the AI assistant", ai::ask),
            command!("clearhistory", "clearhistory", "Forget our AI conversation", ai::clear_history),
            // Notes
            command!("note", "note <text>", "Save a note", notes::add),
            command!("notes", "notes", "List your notes", notes::list),
            command!("delnote", "delnote <id>", "Delete a note", notes::delete),
            command!("findnote", "findnote <text>", "Search your notes", notes::find),
            command!("clearnotes", "clearnotes", "Delete all your notes", notes::clear),
            // Memory
            command!("memorysave", "memorysave <key> <value>", "Remember a value", memory::save),
            command!("memoryget", "memoryget <key>", "Recall a value", memory::get),
            command!("memorylist", "memorylist", "List remembered values", memory::list),
            command!("memorydel", "memorydel <key>", "Forget a value", memory::delete),
            // Fun
            command!("joke", "joke", "Random joke", fun::joke),
            command!("fact", "fact", "Random fact", fun::fact),
            command!("quote", "quote", "Random quote", fun::quote),
            command!("quiz", "quiz", "Answer a trivia question for points", fun::quiz),
            command!("coin", "coin", "Flip a coin", fun::coin),
            command!("dice", "dice [sides]", "Roll a die", fun::dice),
            command!("8ball", "8ball <question>", "Ask the magic 8-ball", fun::eight_ball),
            // Tools
            command!("math", "math <expression>", "Evaluate arithmetic", tools::calculate),
            command!("calculate", "calculate <expression>", "Evaluate arithmetic", tools::calculate),
            command!("password", "password [length]", "Generate a random password", tools::password),
            command!("qr", "qr <text>", "Make a QR code", tools::qr),
            command!("shorturl", "shorturl <url>", "Shorten a link", tools::short_url),
            command!("ip", "ip", "Public IP of the bot host", tools::ip),
            // Lookups
            command!("weather", "weather <city>", "Current weather", lookup::weather),
            command!("currency", "currency <amount> <FROM> <TO>", "Convert currencies", lookup::currency),
            command!("translate", "translate <lang> <text>", "Translate text", lookup::translate),
            command!("language", "language [code]", "Show or set your language", lookup::language),
            // Profile
            command!("rank", "rank", "Your points and rank", profile::rank),
            command!("profile", "profile", "Your profile", profile::profile),
            command!("stats", "stats", "Bot statistics", profile::stats),
            command!("vip", "vip", "VIP status and perks", profile::vip),
            // Reminders
            command!("remind", "remind <10m|2h|1d> <text>", "Set a reminder", reminders::remind),
            command!("reminders", "reminders", "List your reminders", reminders::list),
            command!("delreminder", "delreminder <id>", "Delete a reminder", reminders::delete),
            command!("nickname", "nickname [name]", "Set or clear your nickname", profile::nickname),
            // Admin
            command!(admin "grant_vip", "grant_vip <user id>", "Give a user VIP", admin::grant_vip),
            command!(admin "revoke_vip", "revoke_vip <user id>", "Remove a user's VIP", admin::revoke_vip),
            command!(admin "broadcast", "broadcast <text>", "Message every user", admin::broadcast),
            command!(admin "users", "users", "User count and leaderboard", admin::users),
            command!(admin "maintenance", "maintenance [on|off]", "Toggle maintenance mode", admin::maintenance),
            command!(admin "backup", "backup", "Write a JSON backup", admin::backup),
        ];

        let mut registry = CommandRegistry::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_complete() {
        let registry = CommandRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 49);
        assert!(registry.get("8ball").is_some());
        assert!(registry.get("Help").is_none());
        assert!(registry.get("backup").unwrap().admin_only);
        assert!(!registry.get("note").unwrap().admin_only);
    }

    #[test]
    fn test_registry_keeps_order() {
        let registry = CommandRegistry::builtin().unwrap();
        let names: Vec<&str> = registry.iter().map(|c| c.name).take(3).collect();
        assert_eq!(names, vec!["start", "help", "info"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = CommandRegistry::new();
        registry
            .register(command!("coin", "coin", "Flip", fun::coin))
            .unwrap();
        assert!(registry
            .register(command!("coin", "coin", "Flip", fun::coin))
            .is_err());
    }

    #[test]
    fn test_split_first_arg() {
        let inv = Invocation {
            user_id: 1,
            user_name: "u".to_string(),
            channel_id: 2,
            is_private: true,
            command: "memorysave".to_string(),
            args: "  color   deep blue ".to_string(),
        };
        assert_eq!(inv.split_first_arg(), Some(("color", "deep blue")));
        assert_eq!(inv.redirect("notes", "").split_first_arg(), None);
    }
}
