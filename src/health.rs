//! Keep-alive HTTP endpoint. Hosting platforms that idle processes without
//! inbound traffic get `/` and `/health`; the self-ping job targets the latter.

use crate::context::BotContext;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: i64,
    pub users: usize,
}

pub fn app(ctx: Arc<BotContext>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(ctx)
}

async fn index() -> &'static str {
    "Bot is running"
}

pub async fn health(State(ctx): State<Arc<BotContext>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: ctx.uptime().num_seconds(),
        users: ctx.users.len(),
    })
}

pub async fn serve(ctx: Arc<BotContext>, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind health endpoint on {addr}"))?;

    info!("Health endpoint listening on http://{}", addr);
    axum::serve(listener, app(ctx))
        .await
        .context("Health endpoint stopped")?;
    Ok(())
}
