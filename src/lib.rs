// Shared types and configuration
pub mod config;
pub mod models;

// Persistence and in-memory state
pub mod database;
pub mod history;
pub mod users;

// Outbound collaborators
pub mod notifier;
pub mod services;

// Helpers used by commands
pub mod calc;
pub mod system_info;
pub mod timeparse;

// Application layer
pub mod commands;
pub mod context;
pub mod guard;
pub mod health;
pub mod jobs;
pub mod router;

pub use config::Config;
pub use context::BotContext;
pub use database::Database;
pub use jobs::JobRunner;
pub use router::{InboundEvent, Router};
