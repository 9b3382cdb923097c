//! # Feature: User Directory
//!
//! In-memory view of every known user. Handlers mutate users here; the
//! autosave job writes the changed ones back to the database.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Dirty tracking so autosave only writes what changed
//! - 1.0.0: Initial release

use crate::database::Database;
use crate::models::{Role, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use log::{debug, info};
use std::sync::Arc;

/// Rank titles by minimum points, ascending
pub const RANKS: &[(i64, &str)] = &[
    (0, "🌱 Newcomer"),
    (50, "🙂 Regular"),
    (200, "🔥 Enthusiast"),
    (500, "🏅 Veteran"),
    (1000, "👑 Legend"),
];

pub fn rank_title(points: i64) -> &'static str {
    RANKS
        .iter()
        .rev()
        .find(|(min, _)| points >= *min)
        .map(|(_, title)| *title)
        .unwrap_or(RANKS[0].1)
}

/// Points needed for the next rank, if there is one
pub fn next_rank(points: i64) -> Option<(i64, &'static str)> {
    RANKS
        .iter()
        .find(|(min, _)| *min > points)
        .map(|(min, title)| (*min - points, *title))
}

#[derive(Clone, Default)]
pub struct UserDirectory {
    users: Arc<DashMap<u64, User>>,
    dirty: Arc<DashSet<u64>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the directory from persisted rows; nothing starts dirty
    pub async fn load(database: &Database) -> Result<Self> {
        let directory = Self::new();
        for user in database.load_users().await? {
            directory.users.insert(user.id, user);
        }
        info!("Loaded {} users", directory.users.len());
        Ok(directory)
    }

    /// Register on first contact, otherwise refresh name and last_seen
    pub fn touch(&self, user_id: u64, name: &str, now: DateTime<Utc>) -> User {
        let mut entry = self
            .users
            .entry(user_id)
            .or_insert_with(|| {
                info!("Registered new user {user_id} ({name})");
                User::new(user_id, name, now)
            });
        entry.name = name.to_string();
        entry.last_seen = now;
        let user = entry.clone();
        drop(entry);
        self.dirty.insert(user_id);
        user
    }

    pub fn get(&self, user_id: u64) -> Option<User> {
        self.users.get(&user_id).map(|u| u.clone())
    }

    pub fn contains(&self, user_id: u64) -> bool {
        self.users.contains_key(&user_id)
    }

    /// Apply `f` to a known user and mark it for the next flush
    pub fn update<F, T>(&self, user_id: u64, f: F) -> Option<T>
    where
        F: FnOnce(&mut User) -> T,
    {
        let result = self.users.get_mut(&user_id).map(|mut user| f(&mut user))?;
        self.dirty.insert(user_id);
        Some(result)
    }

    pub fn add_points(&self, user_id: u64, points: i64) -> Option<i64> {
        self.update(user_id, |user| {
            user.points += points;
            user.points
        })
    }

    /// Counts one command invocation and awards its point
    pub fn record_command(&self, user_id: u64) {
        self.update(user_id, |user| {
            user.command_count += 1;
            user.points += 1;
        });
    }

    pub fn set_role(&self, user_id: u64, role: Role) -> bool {
        self.update(user_id, |user| user.role = role).is_some()
    }

    pub fn all(&self) -> Vec<User> {
        self.users.iter().map(|u| u.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Users sorted by points, highest first; ties broken by earlier registration
    pub fn leaderboard(&self) -> Vec<User> {
        let mut users = self.all();
        users.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(a.registered_at.cmp(&b.registered_at))
                .then(a.id.cmp(&b.id))
        });
        users
    }

    /// 1-based leaderboard position
    pub fn position(&self, user_id: u64) -> Option<usize> {
        self.leaderboard()
            .iter()
            .position(|u| u.id == user_id)
            .map(|p| p + 1)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Write every user changed since the last flush. Users that fail to save
    /// stay dirty for the next attempt.
    pub async fn flush(&self, database: &Database) -> Result<usize> {
        let pending: Vec<u64> = self.dirty.iter().map(|id| *id).collect();
        let mut written = 0;

        for user_id in pending {
            self.dirty.remove(&user_id);
            let Some(user) = self.get(user_id) else {
                continue;
            };
            if let Err(e) = database.upsert_user(&user).await {
                self.dirty.insert(user_id);
                return Err(e);
            }
            written += 1;
        }

        debug!("Flushed {written} users");
        Ok(written)
    }
}
