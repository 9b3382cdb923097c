//! Shared state handed to every command handler and job.

use crate::commands::CommandRegistry;
use crate::config::Config;
use crate::database::Database;
use crate::history::ConversationHistory;
use crate::models::Role;
use crate::notifier::Notifier;
use crate::services::ExternalServices;
use crate::users::UserDirectory;
use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use std::sync::Arc;

/// Key of the persisted maintenance flag in `bot_settings`
pub const MAINTENANCE_KEY: &str = "maintenance";

pub struct BotContext {
    pub config: Arc<Config>,
    pub database: Database,
    pub users: UserDirectory,
    pub history: ConversationHistory,
    pub services: Arc<dyn ExternalServices>,
    pub notifier: Arc<dyn Notifier>,
    pub registry: Arc<CommandRegistry>,
    pub started_at: DateTime<Utc>,
    /// (user, question) pairs that already earned quiz points
    pub answered_quizzes: DashSet<(u64, usize)>,
}

impl BotContext {
    /// Assemble a context, loading known users from the database
    pub async fn new(
        config: Config,
        database: Database,
        services: Arc<dyn ExternalServices>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let users = UserDirectory::load(&database).await?;

        Ok(BotContext {
            config: Arc::new(config),
            database,
            users,
            history: ConversationHistory::new(),
            services,
            notifier,
            registry: Arc::new(CommandRegistry::builtin()?),
            started_at: Utc::now(),
            answered_quizzes: DashSet::new(),
        })
    }

    /// Effective role: configured admins always win over the stored role
    pub fn role_of(&self, user_id: u64) -> Role {
        if self.config.is_admin(user_id) {
            return Role::Admin;
        }
        self.users
            .get(user_id)
            .map(|u| u.role)
            .unwrap_or_default()
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.role_of(user_id) == Role::Admin
    }

    /// Conversation length allowed for this user
    pub fn history_limit(&self, user_id: u64) -> usize {
        if self.role_of(user_id).is_vip() {
            self.config.vip_history_limit
        } else {
            self.config.history_limit
        }
    }

    pub async fn maintenance_enabled(&self) -> Result<bool> {
        Ok(self
            .database
            .get_bot_setting(MAINTENANCE_KEY)
            .await?
            .map(|v| v == "on")
            .unwrap_or(false))
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}
