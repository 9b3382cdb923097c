//! Shared fixtures: an in-memory context with fake outbound services.

#![allow(dead_code)]

use anyhow::Result;
use chrono::{Duration, Utc};
use helper_bot::commands::Reply;
use helper_bot::config::Config;
use helper_bot::context::BotContext;
use helper_bot::database::Database;
use helper_bot::models::ChatTurn;
use helper_bot::notifier::Notifier;
use helper_bot::router::{InboundEvent, Router};
use helper_bot::services::ExternalServices;
use serenity::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

pub const ADMIN_ID: u64 = 1;
pub const ALICE: u64 = 100;
pub const BOB: u64 = 200;
pub const GUILD_CHANNEL: u64 = 5000;

#[derive(Default)]
pub struct FakeServices {
    pub fail: bool,
    pub ping_status: AtomicU16,
}

impl FakeServices {
    pub fn failing() -> Self {
        FakeServices {
            fail: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            anyhow::bail!("service unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl ExternalServices for FakeServices {
    fn chat_available(&self) -> bool {
        true
    }

    async fn chat(&self, messages: &[ChatTurn]) -> Result<String> {
        self.check()?;
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(format!("echo: {last}"))
    }

    async fn weather(&self, city: &str) -> Result<String> {
        self.check()?;
        Ok(format!("{city}: ☀️ +20°C"))
    }

    async fn convert_currency(&self, amount: f64, _from: &str, _to: &str) -> Result<f64> {
        self.check()?;
        Ok(amount * 2.0)
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        self.check()?;
        Ok(format!("[{target_language}] {text}"))
    }

    async fn shorten_url(&self, _url: &str) -> Result<String> {
        self.check()?;
        Ok("https://is.gd/abc123".to_string())
    }

    async fn public_ip(&self) -> Result<String> {
        self.check()?;
        Ok("203.0.113.7".to_string())
    }

    async fn ping(&self, _url: &str) -> Result<u16> {
        self.check()?;
        match self.ping_status.load(Ordering::SeqCst) {
            0 => Ok(200),
            status => Ok(status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Channel(u64, String),
    User(u64, String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    /// The `ping` of every channel post, in order
    pub pings: Mutex<Vec<Option<u64>>>,
    pub fail_channels: bool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn pings(&self) -> Vec<Option<u64>> {
        self.pings.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_to_channel(&self, channel_id: u64, text: &str, ping: Option<u64>) -> Result<()> {
        if self.fail_channels {
            anyhow::bail!("missing access");
        }
        self.pings.lock().unwrap().push(ping);
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Channel(channel_id, text.to_string()));
        Ok(())
    }

    async fn send_to_user(&self, user_id: u64, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::User(user_id, text.to_string()));
        Ok(())
    }
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("helper-bot-test-{}", uuid::Uuid::new_v4()))
}

pub fn test_config() -> Config {
    Config {
        discord_token: "test-token".to_string(),
        admin_ids: vec![ADMIN_ID],
        backup_dir: temp_dir().to_string_lossy().into_owned(),
        ..Default::default()
    }
}

pub struct Harness {
    pub ctx: Arc<BotContext>,
    pub router: Router,
    pub notifier: Arc<RecordingNotifier>,
}

pub async fn build(config: Config, services: FakeServices, notifier: RecordingNotifier) -> Harness {
    let database = Database::new(":memory:").await.unwrap();
    let notifier = Arc::new(notifier);
    let ctx = BotContext::new(config, database, Arc::new(services), notifier.clone())
        .await
        .unwrap();
    from_context(ctx, notifier)
}

pub fn from_context(ctx: BotContext, notifier: Arc<RecordingNotifier>) -> Harness {
    let ctx = Arc::new(ctx);
    Harness {
        router: Router::new(ctx.clone()),
        ctx,
        notifier,
    }
}

pub async fn harness() -> Harness {
    build(test_config(), FakeServices::default(), RecordingNotifier::default()).await
}

pub fn guild_text(user_id: u64, text: &str) -> InboundEvent {
    InboundEvent::Text {
        user_id,
        user_name: format!("user{user_id}"),
        channel_id: GUILD_CHANNEL,
        is_private: false,
        text: text.to_string(),
        sent_at: Utc::now(),
    }
}

pub fn private_text(user_id: u64, text: &str) -> InboundEvent {
    InboundEvent::Text {
        user_id,
        user_name: format!("user{user_id}"),
        channel_id: user_id + 10_000,
        is_private: true,
        text: text.to_string(),
        sent_at: Utc::now(),
    }
}

pub fn stale_text(user_id: u64, text: &str) -> InboundEvent {
    InboundEvent::Text {
        user_id,
        user_name: format!("user{user_id}"),
        channel_id: GUILD_CHANNEL,
        is_private: false,
        text: text.to_string(),
        sent_at: Utc::now() - Duration::minutes(5),
    }
}

pub fn button(user_id: u64, payload: &str) -> InboundEvent {
    InboundEvent::Button {
        user_id,
        user_name: format!("user{user_id}"),
        channel_id: GUILD_CHANNEL,
        is_private: false,
        payload: payload.to_string(),
        sent_at: Utc::now(),
    }
}

pub fn stale_button(user_id: u64, payload: &str) -> InboundEvent {
    InboundEvent::Button {
        user_id,
        user_name: format!("user{user_id}"),
        channel_id: GUILD_CHANNEL,
        is_private: false,
        payload: payload.to_string(),
        sent_at: Utc::now() - Duration::minutes(5),
    }
}

impl Harness {
    /// Send a guild message and return the reply text
    pub async fn say(&self, user_id: u64, text: &str) -> String {
        self.router
            .route(guild_text(user_id, text))
            .await
            .map(|r| r.content)
            .unwrap_or_default()
    }

    pub async fn reply(&self, event: InboundEvent) -> Option<Reply> {
        self.router.route(event).await
    }
}
