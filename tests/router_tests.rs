//! Router Integration Tests
//!
//! Drive the router the way the gateway does, against an in-memory
//! database and fake outbound services.
//!
//! Run with: `cargo test --test router_tests`

mod common;

use common::*;
use futures::future::BoxFuture;
use futures::FutureExt;
use helper_bot::commands::ai::AI_NOT_CONFIGURED;
use helper_bot::commands::callbacks::EXPIRED;
use helper_bot::commands::{CommandRegistry, CommandSpec, HandlerResult, Invocation};
use helper_bot::context::BotContext;
use helper_bot::database::Database;
use helper_bot::models::Role;
use helper_bot::router::{ADMIN_ONLY, GENERIC_ERROR, MAINTENANCE_NOTICE};
use helper_bot::services::HttpServices;
use std::sync::Arc;

// ============================================================================
// Registry Coverage
// ============================================================================

/// Every registered keyword produces exactly one non-error reply
#[tokio::test]
async fn test_every_command_replies() {
    let h = harness().await;
    let names: Vec<&str> = h.ctx.registry.iter().map(|c| c.name).collect();
    assert_eq!(names.len(), 49);

    for name in names {
        let reply = h
            .reply(guild_text(ADMIN_ID, &format!("!{name}")))
            .await
            .unwrap_or_else(|| panic!("no reply for {name}"));
        assert!(!reply.content.is_empty(), "empty reply for {name}");
        assert_ne!(reply.content, GENERIC_ERROR, "{name} failed");
    }

    std::fs::remove_dir_all(&h.ctx.config.backup_dir).ok();
}

#[tokio::test]
async fn test_commands_with_arguments() {
    let h = harness().await;

    assert!(h.say(ALICE, "!math 2 + 3 * 4").await.contains("**14**"));
    assert!(h.say(ALICE, "!calculate 1/0").await.contains("division by zero"));
    assert!(h.say(ALICE, "!weather Paris").await.contains("Paris: ☀️"));
    assert!(h.say(ALICE, "!currency 10 usd eur").await.contains("20.00 EUR"));
    assert!(h.say(ALICE, "!translate de hello").await.contains("[de] hello"));
    assert!(h.say(ALICE, "!shorturl https://example.com").await.contains("is.gd"));
    assert!(h.say(ALICE, "!shorturl ftp://example.com").await.contains("Only http"));
    assert!(h.say(ALICE, "!qr hello").await.contains("api.qrserver.com"));
    assert!(h.say(ALICE, "!dice 1").await.starts_with("Usage"));
    assert!(h.say(ALICE, "!dice 20").await.contains("(d20)"));
    assert!(h.say(ALICE, "!password 7").await.starts_with("Usage"));
}

// ============================================================================
// Unknown Commands
// ============================================================================

#[tokio::test]
async fn test_unknown_command_mutates_nothing() {
    let h = harness().await;

    let reply = h.say(ALICE, "!frobnicate now").await;
    assert!(reply.contains("Unknown command"));
    assert!(reply.contains("!help"));

    assert!(!h.ctx.users.contains(ALICE));
    assert_eq!(h.ctx.users.dirty_count(), 0);
    let stats = h.ctx.database.get_stats().await.unwrap();
    assert_eq!(stats.commands_run, 0);
    assert_eq!(stats.users, 0);
}

#[tokio::test]
async fn test_commands_are_case_sensitive() {
    let h = harness().await;
    assert!(h.say(ALICE, "!HELP").await.contains("Unknown command"));
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_note_scenario() {
    let h = harness().await;

    assert_eq!(h.say(ALICE, "!note buy milk").await, "📝 Saved note `#1`.");

    let listing = h.reply(guild_text(ALICE, "!notes")).await.unwrap();
    assert!(listing.content.contains("buy milk"));
    assert_eq!(listing.buttons[0].payload, "clearnotes:confirm");

    // Bob can't see or delete Alice's note
    assert!(h.say(BOB, "!notes").await.contains("no notes"));
    assert!(h.say(BOB, "!delnote 1").await.contains("no note"));

    assert!(h.say(ALICE, "!delnote #1").await.contains("Deleted note `#1`"));
    assert!(h.say(ALICE, "!notes").await.contains("no notes"));
}

#[tokio::test]
async fn test_clear_notes_button() {
    let h = harness().await;
    h.say(ALICE, "!note one").await;
    h.say(ALICE, "!note two").await;

    let reply = h.reply(button(ALICE, "clearnotes:confirm")).await.unwrap();
    assert!(reply.content.contains("Deleted 2 note(s)"));
    assert!(h.ctx.database.get_user_notes(ALICE).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_memory_scenario() {
    let h = harness().await;

    h.say(ALICE, "!memorysave Color deep blue").await;
    assert!(h.say(ALICE, "!memoryget color").await.contains("deep blue"));
    h.say(ALICE, "!memorysave color green").await;
    assert!(h.say(ALICE, "!memorylist").await.contains("(1)"));
    assert!(h.say(ALICE, "!memorydel color").await.contains("Forgot"));
    assert!(h.say(ALICE, "!memoryget color").await.contains("Nothing saved"));
}

#[tokio::test]
async fn test_points_and_usage_are_recorded() {
    let h = harness().await;
    h.say(ALICE, "!coin").await;
    h.say(ALICE, "!dice").await;

    let user = h.ctx.users.get(ALICE).unwrap();
    assert_eq!(user.points, 2);
    assert_eq!(user.command_count, 2);
    assert_eq!(h.ctx.database.get_stats().await.unwrap().commands_run, 2);
}

#[tokio::test]
async fn test_profile_settings() {
    let h = harness().await;
    h.say(ALICE, "!nickname Ally").await;
    h.say(ALICE, "!language de").await;

    let user = h.ctx.users.get(ALICE).unwrap();
    assert_eq!(user.display_name(), "Ally");
    assert_eq!(user.language, "de");
    assert!(h.say(ALICE, "!language").await.contains("`de`"));

    h.say(ALICE, "!nickname").await;
    assert_eq!(h.ctx.users.get(ALICE).unwrap().nickname, None);
}

// ============================================================================
// Permissions & Maintenance
// ============================================================================

#[tokio::test]
async fn test_admin_commands_rejected_for_members() {
    let h = harness().await;
    assert_eq!(h.say(ALICE, "!backup").await, ADMIN_ONLY);
    assert_eq!(h.say(ALICE, "!grant_vip 100").await, ADMIN_ONLY);
}

#[tokio::test]
async fn test_grant_and_revoke_vip() {
    let h = harness().await;
    h.say(ALICE, "!start").await;

    assert!(h.say(ADMIN_ID, "!grant_vip 100").await.contains("VIP"));
    assert_eq!(h.ctx.role_of(ALICE), Role::Vip);
    assert_eq!(h.ctx.history_limit(ALICE), h.ctx.config.vip_history_limit);

    h.say(ADMIN_ID, "!revoke_vip <@100>").await;
    assert_eq!(h.ctx.role_of(ALICE), Role::Normal);

    assert!(h.say(ADMIN_ID, "!grant_vip 999").await.contains("never talked"));
    assert!(h.say(ADMIN_ID, "!revoke_vip 1").await.contains("admin"));
}

#[tokio::test]
async fn test_maintenance_blocks_members_only() {
    let h = harness().await;

    h.say(ADMIN_ID, "!maintenance on").await;
    assert_eq!(h.say(ALICE, "!joke").await, MAINTENANCE_NOTICE);
    assert_eq!(
        h.reply(button(ALICE, "joke")).await.unwrap().content,
        MAINTENANCE_NOTICE
    );
    assert_ne!(h.say(ADMIN_ID, "!joke").await, MAINTENANCE_NOTICE);

    h.say(ADMIN_ID, "!maintenance off").await;
    assert_ne!(h.say(ALICE, "!joke").await, MAINTENANCE_NOTICE);
}

#[tokio::test]
async fn test_broadcast_reaches_every_user() {
    let h = harness().await;
    h.say(ALICE, "!start").await;
    h.say(BOB, "!start").await;

    let reply = h.say(ADMIN_ID, "!broadcast hello all").await;
    assert!(reply.contains("3 delivered, 0 failed"));
    assert_eq!(h.notifier.sent().len(), 3);
}

#[tokio::test]
async fn test_backup_writes_snapshot() {
    let h = harness().await;
    h.say(ALICE, "!note keep me").await;

    let reply = h.say(ADMIN_ID, "!backup").await;
    assert!(reply.contains("backup-"));

    let dir = std::path::Path::new(&h.ctx.config.backup_dir);
    let entry = std::fs::read_dir(dir).unwrap().next().unwrap().unwrap();
    let json = std::fs::read_to_string(entry.path()).unwrap();
    let snapshot: helper_bot::models::Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.notes.len(), 1);
    assert_eq!(snapshot.users.len(), 2);

    std::fs::remove_dir_all(dir).ok();
}

// ============================================================================
// Error Boundary
// ============================================================================

#[tokio::test]
async fn test_failing_service_returns_generic_error() {
    let h = build(test_config(), FakeServices::failing(), RecordingNotifier::default()).await;

    assert_eq!(h.say(ALICE, "!weather Paris").await, GENERIC_ERROR);
    assert_eq!(h.say(ALICE, "!ai hi").await, GENERIC_ERROR);
    // Failed AI exchanges are not remembered
    assert_eq!(h.ctx.history.len(ALICE), 0);
    // The bot keeps working
    assert!(h.say(ALICE, "!coin").await.contains("!"));
}

#[tokio::test]
async fn test_ai_without_api_key_says_not_configured() {
    let config = test_config();
    assert!(config.openai_api_key.is_none());
    let services = HttpServices::new(&config).unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let database = Database::new(":memory:").await.unwrap();
    let ctx = BotContext::new(config, database, Arc::new(services), notifier.clone())
        .await
        .unwrap();
    let h = from_context(ctx, notifier);

    assert_eq!(h.say(ALICE, "!ai hello").await, AI_NOT_CONFIGURED);
    let reply = h.reply(private_text(ALICE, "hello")).await.unwrap();
    assert_eq!(reply.content, AI_NOT_CONFIGURED);
    assert_eq!(h.ctx.history.len(ALICE), 0);
}

fn exploding<'a>(_ctx: &'a BotContext, _inv: &'a Invocation) -> BoxFuture<'a, HandlerResult> {
    async {
        if true {
            panic!("handler exploded");
        }
        Ok(None)
    }
    .boxed()
}

#[tokio::test]
async fn test_panicking_handler_returns_generic_error() {
    let database = helper_bot::database::Database::new(":memory:").await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let mut ctx = BotContext::new(
        test_config(),
        database,
        Arc::new(FakeServices::default()),
        notifier.clone(),
    )
    .await
    .unwrap();

    let mut registry = CommandRegistry::new();
    registry
        .register(CommandSpec {
            name: "boom",
            usage: "boom",
            description: "Always panics",
            admin_only: false,
            handler: exploding,
        })
        .unwrap();
    ctx.registry = Arc::new(registry);
    let h = from_context(ctx, notifier);

    assert_eq!(h.say(ALICE, "!boom").await, GENERIC_ERROR);
    assert_eq!(h.say(ALICE, "!boom").await, GENERIC_ERROR);
}

// ============================================================================
// Event Filtering
// ============================================================================

#[tokio::test]
async fn test_events_before_startup_are_discarded() {
    let h = harness().await;
    assert!(h.reply(stale_text(ALICE, "!help")).await.is_none());
    assert!(!h.ctx.users.contains(ALICE));

    assert!(h.reply(stale_button(ALICE, "joke")).await.is_none());
    assert!(!h.ctx.users.contains(ALICE));
    assert!(h.reply(button(ALICE, "joke")).await.is_some());
    assert!(h.ctx.users.contains(ALICE));
}

#[tokio::test]
async fn test_plain_text_routing() {
    let h = harness().await;

    assert!(h.reply(guild_text(ALICE, "hello there")).await.is_none());

    let reply = h.reply(private_text(ALICE, "hello there")).await.unwrap();
    assert_eq!(reply.content, "echo: hello there");
    assert_eq!(h.ctx.history.len(ALICE), 2);

    assert!(h.say(ALICE, "!clearhistory").await.contains("Forgot 2"));
    assert_eq!(h.ctx.history.len(ALICE), 0);
}

// ============================================================================
// Buttons
// ============================================================================

#[tokio::test]
async fn test_quiz_points_awarded_once() {
    let h = harness().await;

    // Question 0: answer index 1 is correct
    let first = h.reply(button(ALICE, "quiz:0:1")).await.unwrap();
    assert!(first.content.contains("+5 points"));
    let second = h.reply(button(ALICE, "quiz:0:1")).await.unwrap();
    assert!(second.content.contains("already answered"));
    let wrong = h.reply(button(ALICE, "quiz:1:0")).await.unwrap();
    assert!(wrong.content.contains("wrong"));

    assert_eq!(h.ctx.users.get(ALICE).unwrap().points, 5);
}

#[tokio::test]
async fn test_start_buttons_and_unknown_payload() {
    let h = harness().await;

    let start = h.reply(guild_text(ALICE, "!start")).await.unwrap();
    let payloads: Vec<&str> = start.buttons.iter().map(|b| b.payload.as_str()).collect();
    assert_eq!(payloads, vec!["help", "profile", "joke"]);

    for payload in payloads {
        let reply = h.reply(button(ALICE, payload)).await.unwrap();
        assert_ne!(reply.content, GENERIC_ERROR);
    }

    assert_eq!(h.reply(button(ALICE, "nope")).await.unwrap().content, EXPIRED);
}

#[tokio::test]
async fn test_help_hides_admin_commands() {
    let h = harness().await;
    assert!(!h.say(ALICE, "!help").await.contains("!backup"));
    assert!(h.say(ADMIN_ID, "!help").await.contains("!backup"));
}
