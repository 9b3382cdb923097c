use crate::models::{MemoryEntry, Note, Reminder, Role, Snapshot, StoreStats, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use sqlite::{Connection, State, Statement, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

fn to_ts(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

fn from_ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn optional_text(value: Option<&str>) -> Value {
    match value {
        Some(v) => Value::String(v.to_string()),
        None => Value::Null,
    }
}

/// Number of rows touched by the last statement on this connection
fn last_changes(conn: &Connection) -> Result<i64> {
    let mut check = conn.prepare("SELECT changes()")?;
    check.next()?;
    Ok(check.read::<i64, _>(0)?)
}

fn last_insert_id(conn: &Connection) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT last_insert_rowid()")?;
    stmt.next()?;
    Ok(stmt.read::<i64, _>(0)?)
}

fn count(conn: &Connection, sql: &str) -> Result<i64> {
    let mut stmt = conn.prepare(sql)?;
    stmt.next()?;
    Ok(stmt.read::<i64, _>(0)?)
}

const USER_COLUMNS: &str =
    "id, name, nickname, role, points, language, registered_at, last_seen, command_count";

fn read_user(statement: &Statement) -> Result<User> {
    Ok(User {
        id: statement.read::<i64, _>(0)? as u64,
        name: statement.read::<String, _>(1)?,
        nickname: statement.read::<Option<String>, _>(2)?,
        role: Role::parse(&statement.read::<String, _>(3)?),
        points: statement.read::<i64, _>(4)?,
        language: statement.read::<String, _>(5)?,
        registered_at: from_ts(statement.read::<i64, _>(6)?),
        last_seen: from_ts(statement.read::<i64, _>(7)?),
        command_count: statement.read::<i64, _>(8)?,
    })
}

fn read_note(statement: &Statement) -> Result<Note> {
    Ok(Note {
        id: statement.read::<i64, _>(0)?,
        user_id: statement.read::<i64, _>(1)? as u64,
        content: statement.read::<String, _>(2)?,
        created_at: from_ts(statement.read::<i64, _>(3)?),
    })
}

fn read_memory(statement: &Statement) -> Result<MemoryEntry> {
    Ok(MemoryEntry {
        user_id: statement.read::<i64, _>(0)? as u64,
        key: statement.read::<String, _>(1)?,
        value: statement.read::<String, _>(2)?,
        updated_at: from_ts(statement.read::<i64, _>(3)?),
    })
}

fn read_reminder(statement: &Statement) -> Result<Reminder> {
    Ok(Reminder {
        id: statement.read::<i64, _>(0)?,
        user_id: statement.read::<i64, _>(1)? as u64,
        channel_id: statement.read::<i64, _>(2)? as u64,
        text: statement.read::<String, _>(3)?,
        due_at: from_ts(statement.read::<i64, _>(4)?),
        fired: statement.read::<i64, _>(5)? != 0,
        created_at: from_ts(statement.read::<i64, _>(6)?),
    })
}

const REMINDER_COLUMNS: &str = "id, user_id, channel_id, reminder_text, due_at, fired, created_at";

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        let connection = sqlite::open(database_path)?;
        let db = Database {
            connection: Arc::new(Mutex::new(connection)),
        };

        db.init_tables().await?;
        info!("Database initialized at: {database_path}");
        Ok(db)
    }

    async fn init_tables(&self) -> Result<()> {
        let conn = self.connection.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                nickname TEXT,
                role TEXT NOT NULL DEFAULT 'normal',
                points INTEGER NOT NULL DEFAULT 0,
                language TEXT NOT NULL DEFAULT 'en',
                registered_at INTEGER NOT NULL,
                last_seen INTEGER NOT NULL,
                command_count INTEGER NOT NULL DEFAULT 0
            )",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notes_user
             ON notes(user_id)",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS memory_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                memory_key TEXT NOT NULL,
                memory_value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(user_id, memory_key)
            )",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS reminders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                channel_id INTEGER NOT NULL,
                reminder_text TEXT NOT NULL,
                due_at INTEGER NOT NULL,
                fired INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_reminder_due
             ON reminders(fired, due_at)",
        )?;

        // Global bot configuration (maintenance flag, birthday bookkeeping)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS bot_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                setting_key TEXT NOT NULL UNIQUE,
                setting_value TEXT,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS command_usage (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                command TEXT NOT NULL,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )?;

        Ok(())
    }

    // User Methods

    /// Insert or overwrite a user row with the in-memory state
    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO users (id, name, nickname, role, points, language, registered_at, last_seen, command_count)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             nickname = excluded.nickname,
             role = excluded.role,
             points = excluded.points,
             language = excluded.language,
             last_seen = excluded.last_seen,
             command_count = excluded.command_count"
        )?;
        statement.bind((1, user.id as i64))?;
        statement.bind((2, user.name.as_str()))?;
        statement.bind((3, optional_text(user.nickname.as_deref())))?;
        statement.bind((4, user.role.as_str()))?;
        statement.bind((5, user.points))?;
        statement.bind((6, user.language.as_str()))?;
        statement.bind((7, to_ts(user.registered_at)))?;
        statement.bind((8, to_ts(user.last_seen)))?;
        statement.bind((9, user.command_count))?;
        statement.next()?;
        Ok(())
    }

    pub async fn load_users(&self) -> Result<Vec<User>> {
        let conn = self.connection.lock().await;
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");
        let mut statement = conn.prepare(&sql)?;

        let mut users = Vec::new();
        while let Ok(State::Row) = statement.next() {
            users.push(read_user(&statement)?);
        }
        Ok(users)
    }

    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>> {
        let conn = self.connection.lock().await;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let mut statement = conn.prepare(&sql)?;
        statement.bind((1, user_id as i64))?;

        if let Ok(State::Row) = statement.next() {
            return Ok(Some(read_user(&statement)?));
        }
        Ok(None)
    }

    // Note Methods
    pub async fn add_note(&self, user_id: u64, content: &str, created_at: DateTime<Utc>) -> Result<i64> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO notes (user_id, content, created_at) VALUES (?, ?, ?)"
        )?;
        statement.bind((1, user_id as i64))?;
        statement.bind((2, content))?;
        statement.bind((3, to_ts(created_at)))?;
        statement.next()?;

        let note_id = last_insert_id(&conn)?;
        info!("Added note {note_id} for user {user_id}");
        Ok(note_id)
    }

    pub async fn get_user_notes(&self, user_id: u64) -> Result<Vec<Note>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT id, user_id, content, created_at
             FROM notes WHERE user_id = ?
             ORDER BY id ASC"
        )?;
        statement.bind((1, user_id as i64))?;

        let mut notes = Vec::new();
        while let Ok(State::Row) = statement.next() {
            notes.push(read_note(&statement)?);
        }
        Ok(notes)
    }

    /// Case-insensitive substring search over the user's own notes
    pub async fn search_notes(&self, user_id: u64, query: &str) -> Result<Vec<Note>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT id, user_id, content, created_at
             FROM notes WHERE user_id = ? AND instr(lower(content), lower(?)) > 0
             ORDER BY id ASC"
        )?;
        statement.bind((1, user_id as i64))?;
        statement.bind((2, query))?;

        let mut notes = Vec::new();
        while let Ok(State::Row) = statement.next() {
            notes.push(read_note(&statement)?);
        }
        Ok(notes)
    }

    pub async fn delete_note(&self, user_id: u64, note_id: i64) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "DELETE FROM notes WHERE id = ? AND user_id = ?"
        )?;
        statement.bind((1, note_id))?;
        statement.bind((2, user_id as i64))?;
        statement.next()?;
        drop(statement);

        let deleted = last_changes(&conn)? > 0;
        if deleted {
            info!("Deleted note {note_id} for user {user_id}");
        }
        Ok(deleted)
    }

    pub async fn clear_notes(&self, user_id: u64) -> Result<i64> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare("DELETE FROM notes WHERE user_id = ?")?;
        statement.bind((1, user_id as i64))?;
        statement.next()?;
        drop(statement);

        let removed = last_changes(&conn)?;
        info!("Cleared {removed} notes for user {user_id}");
        Ok(removed)
    }

    // Memory Methods
    pub async fn save_memory(&self, user_id: u64, key: &str, value: &str, updated_at: DateTime<Utc>) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO memory_entries (user_id, memory_key, memory_value, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, memory_key) DO UPDATE SET
             memory_value = excluded.memory_value,
             updated_at = excluded.updated_at"
        )?;
        statement.bind((1, user_id as i64))?;
        statement.bind((2, key))?;
        statement.bind((3, value))?;
        statement.bind((4, to_ts(updated_at)))?;
        statement.next()?;
        Ok(())
    }

    pub async fn get_memory(&self, user_id: u64, key: &str) -> Result<Option<String>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT memory_value FROM memory_entries WHERE user_id = ? AND memory_key = ?"
        )?;
        statement.bind((1, user_id as i64))?;
        statement.bind((2, key))?;

        if let Ok(State::Row) = statement.next() {
            return Ok(Some(statement.read::<String, _>(0)?));
        }
        Ok(None)
    }

    pub async fn list_memory(&self, user_id: u64) -> Result<Vec<MemoryEntry>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT user_id, memory_key, memory_value, updated_at
             FROM memory_entries WHERE user_id = ?
             ORDER BY memory_key ASC"
        )?;
        statement.bind((1, user_id as i64))?;

        let mut entries = Vec::new();
        while let Ok(State::Row) = statement.next() {
            entries.push(read_memory(&statement)?);
        }
        Ok(entries)
    }

    pub async fn delete_memory(&self, user_id: u64, key: &str) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "DELETE FROM memory_entries WHERE user_id = ? AND memory_key = ?"
        )?;
        statement.bind((1, user_id as i64))?;
        statement.bind((2, key))?;
        statement.next()?;
        drop(statement);

        Ok(last_changes(&conn)? > 0)
    }

    // Reminder Methods
    pub async fn add_reminder(
        &self,
        user_id: u64,
        channel_id: u64,
        reminder_text: &str,
        due_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO reminders (user_id, channel_id, reminder_text, due_at, created_at)
             VALUES (?, ?, ?, ?, ?)"
        )?;
        statement.bind((1, user_id as i64))?;
        statement.bind((2, channel_id as i64))?;
        statement.bind((3, reminder_text))?;
        statement.bind((4, to_ts(due_at)))?;
        statement.bind((5, to_ts(created_at)))?;
        statement.next()?;

        let reminder_id = last_insert_id(&conn)?;
        info!("Added reminder {reminder_id} for user {user_id}");
        Ok(reminder_id)
    }

    /// Unfired reminders whose due time is at or before `now`, oldest first
    pub async fn get_due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let conn = self.connection.lock().await;
        let sql = format!(
            "SELECT {REMINDER_COLUMNS}
             FROM reminders
             WHERE fired = 0 AND due_at <= ?
             ORDER BY due_at ASC"
        );
        let mut statement = conn.prepare(&sql)?;
        statement.bind((1, to_ts(now)))?;

        let mut reminders = Vec::new();
        while let Ok(State::Row) = statement.next() {
            reminders.push(read_reminder(&statement)?);
        }
        Ok(reminders)
    }

    /// Flip the fired flag; returns false if another pass already fired it
    pub async fn mark_reminder_fired(&self, reminder_id: i64) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "UPDATE reminders SET fired = 1 WHERE id = ? AND fired = 0"
        )?;
        statement.bind((1, reminder_id))?;
        statement.next()?;
        drop(statement);

        Ok(last_changes(&conn)? > 0)
    }

    pub async fn get_reminder(&self, reminder_id: i64) -> Result<Option<Reminder>> {
        let conn = self.connection.lock().await;
        let sql = format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?");
        let mut statement = conn.prepare(&sql)?;
        statement.bind((1, reminder_id))?;

        if let Ok(State::Row) = statement.next() {
            return Ok(Some(read_reminder(&statement)?));
        }
        Ok(None)
    }

    pub async fn get_user_reminders(&self, user_id: u64) -> Result<Vec<Reminder>> {
        let conn = self.connection.lock().await;
        let sql = format!(
            "SELECT {REMINDER_COLUMNS}
             FROM reminders
             WHERE user_id = ? AND fired = 0
             ORDER BY due_at ASC"
        );
        let mut statement = conn.prepare(&sql)?;
        statement.bind((1, user_id as i64))?;

        let mut reminders = Vec::new();
        while let Ok(State::Row) = statement.next() {
            reminders.push(read_reminder(&statement)?);
        }
        Ok(reminders)
    }

    pub async fn delete_reminder(&self, user_id: u64, reminder_id: i64) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "DELETE FROM reminders WHERE id = ? AND user_id = ?"
        )?;
        statement.bind((1, reminder_id))?;
        statement.bind((2, user_id as i64))?;
        statement.next()?;
        drop(statement);

        let deleted = last_changes(&conn)? > 0;
        if deleted {
            info!("Deleted reminder {reminder_id} for user {user_id}");
        }
        Ok(deleted)
    }

    // Bot Settings Methods
    pub async fn set_bot_setting(&self, setting_key: &str, setting_value: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO bot_settings (setting_key, setting_value, updated_at)
             VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(setting_key) DO UPDATE SET
             setting_value = excluded.setting_value,
             updated_at = CURRENT_TIMESTAMP"
        )?;
        statement.bind((1, setting_key))?;
        statement.bind((2, setting_value))?;
        statement.next()?;
        info!("Set bot setting {setting_key} = {setting_value}");
        Ok(())
    }

    pub async fn get_bot_setting(&self, setting_key: &str) -> Result<Option<String>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT setting_value FROM bot_settings WHERE setting_key = ?"
        )?;
        statement.bind((1, setting_key))?;

        if let Ok(State::Row) = statement.next() {
            return Ok(statement.read::<Option<String>, _>(0)?);
        }
        Ok(None)
    }

    // Usage Methods
    pub async fn log_usage(&self, user_id: u64, command: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO command_usage (user_id, command) VALUES (?, ?)"
        )?;
        statement.bind((1, user_id as i64))?;
        statement.bind((2, command))?;
        statement.next()?;
        Ok(())
    }

    pub async fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.connection.lock().await;
        Ok(StoreStats {
            users: count(&conn, "SELECT COUNT(*) FROM users")?,
            vips: count(&conn, "SELECT COUNT(*) FROM users WHERE role IN ('vip', 'admin')")?,
            notes: count(&conn, "SELECT COUNT(*) FROM notes")?,
            memory_entries: count(&conn, "SELECT COUNT(*) FROM memory_entries")?,
            pending_reminders: count(&conn, "SELECT COUNT(*) FROM reminders WHERE fired = 0")?,
            commands_run: count(&conn, "SELECT COUNT(*) FROM command_usage")?,
        })
    }

    /// Everything a backup needs, read under a single lock
    pub async fn snapshot(&self, created_at: DateTime<Utc>) -> Result<Snapshot> {
        let conn = self.connection.lock().await;

        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");
        let mut statement = conn.prepare(&sql)?;
        let mut users = Vec::new();
        while let Ok(State::Row) = statement.next() {
            users.push(read_user(&statement)?);
        }

        let mut statement = conn.prepare(
            "SELECT id, user_id, content, created_at FROM notes ORDER BY id ASC"
        )?;
        let mut notes = Vec::new();
        while let Ok(State::Row) = statement.next() {
            notes.push(read_note(&statement)?);
        }

        let mut statement = conn.prepare(
            "SELECT user_id, memory_key, memory_value, updated_at FROM memory_entries ORDER BY id ASC"
        )?;
        let mut memory = Vec::new();
        while let Ok(State::Row) = statement.next() {
            memory.push(read_memory(&statement)?);
        }

        let sql = format!("SELECT {REMINDER_COLUMNS} FROM reminders ORDER BY id ASC");
        let mut statement = conn.prepare(&sql)?;
        let mut reminders = Vec::new();
        while let Ok(State::Row) = statement.next() {
            reminders.push(read_reminder(&statement)?);
        }

        Ok(Snapshot {
            created_at,
            users,
            notes,
            memory,
            reminders,
        })
    }
}
