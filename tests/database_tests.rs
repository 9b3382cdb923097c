//! Persistence Store Tests
//!
//! Run with: `cargo test --test database_tests`

use chrono::{Duration, TimeZone, Utc};
use helper_bot::database::Database;
use helper_bot::models::{Role, User};

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_user_upsert_round_trip() {
    let db = Database::new(":memory:").await.unwrap();
    let joined = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    let mut user = User::new(42, "alice", joined);
    user.nickname = Some("Ally".to_string());
    user.role = Role::Vip;
    user.points = 12;
    db.upsert_user(&user).await.unwrap();

    user.points = 13;
    user.nickname = None;
    db.upsert_user(&user).await.unwrap();

    let stored = db.get_user(42).await.unwrap().unwrap();
    assert_eq!(stored, user);
    assert_eq!(db.load_users().await.unwrap().len(), 1);
    assert!(db.get_user(7).await.unwrap().is_none());
}

// ============================================================================
// Notes
// ============================================================================

#[tokio::test]
async fn test_notes_are_scoped_to_owner() {
    let db = Database::new(":memory:").await.unwrap();
    let now = Utc::now();

    let first = db.add_note(1, "Buy Milk", now).await.unwrap();
    db.add_note(1, "call the bank", now).await.unwrap();
    db.add_note(2, "milk for bob", now).await.unwrap();

    assert_eq!(db.get_user_notes(1).await.unwrap().len(), 2);
    let found = db.search_notes(1, "MILK").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, first);

    assert!(!db.delete_note(2, first).await.unwrap());
    assert!(db.delete_note(1, first).await.unwrap());
    assert!(!db.delete_note(1, first).await.unwrap());

    assert_eq!(db.clear_notes(1).await.unwrap(), 1);
    assert_eq!(db.get_user_notes(2).await.unwrap().len(), 1);
}

// ============================================================================
// Memory
// ============================================================================

#[tokio::test]
async fn test_memory_upsert() {
    let db = Database::new(":memory:").await.unwrap();
    let now = Utc::now();

    db.save_memory(1, "color", "blue", now).await.unwrap();
    db.save_memory(1, "color", "green", now).await.unwrap();
    db.save_memory(2, "color", "red", now).await.unwrap();

    assert_eq!(db.get_memory(1, "color").await.unwrap().as_deref(), Some("green"));
    assert_eq!(db.list_memory(1).await.unwrap().len(), 1);
    assert!(db.delete_memory(1, "color").await.unwrap());
    assert!(db.get_memory(1, "color").await.unwrap().is_none());
    assert_eq!(db.get_memory(2, "color").await.unwrap().as_deref(), Some("red"));
}

// ============================================================================
// Reminders
// ============================================================================

#[tokio::test]
async fn test_due_reminders_and_fired_flag() {
    let db = Database::new(":memory:").await.unwrap();
    let now = Utc::now();

    let due = db
        .add_reminder(1, 10, "now", now - Duration::minutes(1), now)
        .await
        .unwrap();
    let later = db
        .add_reminder(1, 10, "later", now + Duration::hours(1), now)
        .await
        .unwrap();

    let pending = db.get_due_reminders(now).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, due);
    assert_eq!(pending[0].channel_id, 10);

    assert!(db.mark_reminder_fired(due).await.unwrap());
    assert!(!db.mark_reminder_fired(due).await.unwrap());
    assert!(db.get_due_reminders(now).await.unwrap().is_empty());

    let listed: Vec<i64> = db
        .get_user_reminders(1)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(listed, vec![later]);

    assert!(!db.delete_reminder(2, later).await.unwrap());
    assert!(db.delete_reminder(1, later).await.unwrap());
}

// ============================================================================
// Settings, Stats, Snapshot
// ============================================================================

#[tokio::test]
async fn test_bot_settings() {
    let db = Database::new(":memory:").await.unwrap();
    assert!(db.get_bot_setting("maintenance").await.unwrap().is_none());

    db.set_bot_setting("maintenance", "on").await.unwrap();
    db.set_bot_setting("maintenance", "off").await.unwrap();
    assert_eq!(
        db.get_bot_setting("maintenance").await.unwrap().as_deref(),
        Some("off")
    );
}

#[tokio::test]
async fn test_stats_and_snapshot() {
    let db = Database::new(":memory:").await.unwrap();
    let now = Utc::now();

    let mut vip = User::new(1, "vip", now);
    vip.role = Role::Vip;
    db.upsert_user(&vip).await.unwrap();
    db.upsert_user(&User::new(2, "plain", now)).await.unwrap();
    db.add_note(1, "n", now).await.unwrap();
    db.save_memory(2, "k", "v", now).await.unwrap();
    db.add_reminder(2, 3, "r", now + Duration::hours(1), now).await.unwrap();
    db.log_usage(1, "help").await.unwrap();
    db.log_usage(2, "note").await.unwrap();

    let stats = db.get_stats().await.unwrap();
    assert_eq!(stats.users, 2);
    assert_eq!(stats.vips, 1);
    assert_eq!(stats.notes, 1);
    assert_eq!(stats.memory_entries, 1);
    assert_eq!(stats.pending_reminders, 1);
    assert_eq!(stats.commands_run, 2);

    let snapshot = db.snapshot(now).await.unwrap();
    assert_eq!(snapshot.users.len(), 2);
    assert_eq!(snapshot.memory[0].key, "k");
    assert_eq!(snapshot.reminders[0].text, "r");
    assert!(serde_json::to_string(&snapshot).unwrap().contains("\"notes\""));
}
