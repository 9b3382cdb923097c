//! Outbound messages that are not replies: reminder deliveries, broadcasts,
//! birthday greetings.

use anyhow::Result;
use log::info;
use serenity::async_trait;
use serenity::builder::CreateAllowedMentions;
use serenity::http::Http;
use serenity::model::id::{ChannelId, UserId};
use std::sync::Arc;

/// Discord rejects message content longer than this
pub const MESSAGE_LIMIT: usize = 2000;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post in a channel. Only `ping` is notified; any other mention in
    /// `text`, `@everyone` included, is rendered inert.
    async fn send_to_channel(&self, channel_id: u64, text: &str, ping: Option<u64>) -> Result<()>;

    /// Direct message to a user
    async fn send_to_user(&self, user_id: u64, text: &str) -> Result<()>;
}

/// Split text into chunks Discord will accept, preferring line boundaries
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if current.chars().count() + line.chars().count() > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if line.chars().count() > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Mention policy for everything the bot posts: user text never reaches
/// `@everyone`, `@here` or roles
pub fn restrict_mentions(
    mentions: &mut CreateAllowedMentions,
    ping: Option<u64>,
) -> &mut CreateAllowedMentions {
    mentions.empty_parse();
    if let Some(user_id) = ping {
        mentions.users(vec![UserId(user_id)]);
    }
    mentions
}

/// Sends through serenity's REST client; works before the gateway is connected
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_to_channel(&self, channel_id: u64, text: &str, ping: Option<u64>) -> Result<()> {
        let channel = ChannelId(channel_id);
        for chunk in split_message(text, MESSAGE_LIMIT) {
            channel
                .send_message(&self.http, |m| {
                    m.content(chunk)
                        .allowed_mentions(|am| restrict_mentions(am, ping))
                })
                .await?;
        }
        Ok(())
    }

    async fn send_to_user(&self, user_id: u64, text: &str) -> Result<()> {
        let dm = UserId(user_id).create_dm_channel(&self.http).await?;
        for chunk in split_message(text, MESSAGE_LIMIT) {
            dm.send_message(&self.http, |m| {
                m.content(chunk)
                    .allowed_mentions(|am| restrict_mentions(am, None))
            })
            .await?;
        }
        info!("Sent DM to user {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_short_message() {
        assert_eq!(split_message("hello", 10), vec!["hello".to_string()]);
    }

    #[test]
    fn test_split_on_lines() {
        let chunks = split_message("aaaa\nbbbb\ncccc", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_split_long_line() {
        let chunks = split_message(&"x".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 5);
    }
}
