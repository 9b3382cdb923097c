//! Persisted record types shared by the store, the handlers and the backup export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission level of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Normal,
    Vip,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Normal => "normal",
            Role::Vip => "vip",
            Role::Admin => "admin",
        }
    }

    /// Unknown values read back from the database degrade to `Normal`
    pub fn parse(value: &str) -> Self {
        match value {
            "vip" => Role::Vip,
            "admin" => Role::Admin,
            _ => Role::Normal,
        }
    }

    /// VIP perks also apply to admins
    pub fn is_vip(&self) -> bool {
        matches!(self, Role::Vip | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Normal => "Member",
            Role::Vip => "VIP ⭐",
            Role::Admin => "Admin 🛡️",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub nickname: Option<String>,
    pub role: Role,
    pub points: i64,
    pub language: String,
    pub registered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub command_count: i64,
}

impl User {
    pub fn new(id: u64, name: &str, now: DateTime<Utc>) -> Self {
        User {
            id,
            name: name.to_string(),
            nickname: None,
            role: Role::Normal,
            points: 0,
            language: "en".to_string(),
            registered_at: now,
            last_seen: now,
            command_count: 0,
        }
    }

    /// Nickname if one is set, otherwise the account name
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub user_id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub user_id: u64,
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub user_id: u64,
    pub channel_id: u64,
    pub text: String,
    pub due_at: DateTime<Utc>,
    pub fired: bool,
    pub created_at: DateTime<Utc>,
}

/// Speaker of a conversation turn, serialized the way chat completion APIs expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        ChatTurn { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatTurn { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatTurn { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Aggregate counters for `!stats`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub users: i64,
    pub vips: i64,
    pub notes: i64,
    pub memory_entries: i64,
    pub pending_reminders: i64,
    pub commands_run: i64,
}

/// Full export written by `!backup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub created_at: DateTime<Utc>,
    pub users: Vec<User>,
    pub notes: Vec<Note>,
    pub memory: Vec<MemoryEntry>,
    pub reminders: Vec<Reminder>,
}
