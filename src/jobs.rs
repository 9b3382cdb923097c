//! # Feature: Periodic Jobs
//!
//! Four background jobs keep the bot healthy: self-ping, autosave, reminder
//! delivery and the yearly birthday greeting.
//!
//! Every job has its own ticker. Tickers only enqueue the job; a single
//! executor drains the queue, so two job bodies never run at the same time.
//! A job that errors or panics is logged and fires again on its next tick.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Serial executor, per-job tickers
//! - 1.0.0: Initial release

use crate::context::BotContext;
use crate::guard;
use crate::models::Role;
use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const SELF_PING_PERIOD: Duration = Duration::from_secs(14 * 60);
pub const AUTOSAVE_PERIOD: Duration = Duration::from_secs(30 * 60);
pub const REMINDER_PERIOD: Duration = Duration::from_secs(60);
pub const BIRTHDAY_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Year of the last birthday greeting, in `bot_settings`
pub const BIRTHDAY_ANNOUNCED_KEY: &str = "birthday_announced_year";

type JobFn = Box<dyn Fn(Arc<BotContext>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub struct Job {
    name: &'static str,
    period: Duration,
    run: JobFn,
}

impl Job {
    pub fn new<F, Fut>(name: &'static str, period: Duration, f: F) -> Self
    where
        F: Fn(Arc<BotContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Job {
            name,
            period,
            run: Box::new(move |ctx| f(ctx).boxed()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[derive(Default)]
pub struct JobRunner {
    jobs: Vec<Job>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    /// The four jobs the bot runs in production
    pub fn standard() -> Self {
        JobRunner::new()
            .with_job(Job::new("self-ping", SELF_PING_PERIOD, self_ping))
            .with_job(Job::new("autosave", AUTOSAVE_PERIOD, autosave))
            .with_job(Job::new("reminder-check", REMINDER_PERIOD, check_reminders))
            .with_job(Job::new("birthday-check", BIRTHDAY_PERIOD, check_birthday))
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Run one job right away through the same error boundary the scheduler
    /// uses. Returns false if the job is unknown or failed.
    pub async fn run_job(&self, name: &str, ctx: Arc<BotContext>) -> bool {
        match self.jobs.iter().find(|j| j.name == name) {
            Some(job) => execute(job, ctx).await,
            None => {
                warn!("No job named '{name}'");
                false
            }
        }
    }

    pub fn spawn(self, ctx: Arc<BotContext>) -> JoinHandle<()> {
        tokio::spawn(self.run(ctx))
    }

    /// Start every ticker and execute queued jobs one at a time, forever
    pub async fn run(self, ctx: Arc<BotContext>) {
        let (tx, mut rx) = mpsc::channel::<usize>(self.jobs.len().max(1) * 2);

        for (index, job) in self.jobs.iter().enumerate() {
            let tx = tx.clone();
            let period = job.period;
            tokio::spawn(async move {
                // First firing one full period after startup
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if tx.send(index).await.is_err() {
                        break;
                    }
                }
            });
            info!("Scheduled job '{}' every {}s", job.name, period.as_secs());
        }
        drop(tx);

        while let Some(index) = rx.recv().await {
            execute(&self.jobs[index], ctx.clone()).await;
        }
    }
}

async fn execute(job: &Job, ctx: Arc<BotContext>) -> bool {
    debug!("Running job '{}'", job.name);
    let label = format!("job '{}'", job.name);
    guard::contain(&label, (job.run)(ctx)).await.is_some()
}

/// Keep-alive request so hosting platforms don't idle the process
pub async fn self_ping(ctx: Arc<BotContext>) -> Result<()> {
    let Some(url) = ctx.config.effective_ping_url() else {
        debug!("Self-ping skipped: no ping URL configured");
        return Ok(());
    };
    let status = ctx.services.ping(&url).await?;
    if !(200..400).contains(&status) {
        anyhow::bail!("Self-ping to {url} returned {status}");
    }
    debug!("Self-ping {} -> {}", url, status);
    Ok(())
}

pub async fn autosave(ctx: Arc<BotContext>) -> Result<()> {
    let written = ctx.users.flush(&ctx.database).await?;
    if written > 0 {
        info!("Autosave wrote {written} users");
    }
    Ok(())
}

/// Deliver due reminders. The fired flag is flipped before sending, so a
/// reminder is delivered at most once even if sending fails.
pub async fn check_reminders(ctx: Arc<BotContext>) -> Result<()> {
    let due = ctx.database.get_due_reminders(Utc::now()).await?;

    for reminder in due {
        if !ctx.database.mark_reminder_fired(reminder.id).await? {
            continue;
        }

        let text = format!("⏰ <@{}> Reminder: {}", reminder.user_id, reminder.text);
        if let Err(e) = ctx
            .notifier
            .send_to_channel(reminder.channel_id, &text, Some(reminder.user_id))
            .await
        {
            warn!(
                "Reminder {} could not be posted in channel {}: {:#}; trying DM",
                reminder.id, reminder.channel_id, e
            );
            if let Err(e) = ctx.notifier.send_to_user(reminder.user_id, &text).await {
                warn!("Reminder {} was not delivered: {:#}", reminder.id, e);
                continue;
            }
        }
        info!("Delivered reminder {} to user {}", reminder.id, reminder.user_id);
    }
    Ok(())
}

/// Whether `date` is the (month, day) birthday; Feb 29 falls back to Feb 28
/// in common years
pub fn is_birthday(date: NaiveDate, month: u32, day: u32) -> bool {
    if month == 2 && day == 29 && NaiveDate::from_ymd_opt(date.year(), 2, 29).is_none() {
        return date.month() == 2 && date.day() == 28;
    }
    date.month() == month && date.day() == day
}

/// Greet every admin once per year on the configured birthday
pub async fn check_birthday(ctx: Arc<BotContext>) -> Result<()> {
    let Some((month, day)) = ctx.config.birthday_date() else {
        return Ok(());
    };
    let today = Utc::now().date_naive();
    if !is_birthday(today, month, day) {
        return Ok(());
    }

    let year = today.year().to_string();
    if ctx.database.get_bot_setting(BIRTHDAY_ANNOUNCED_KEY).await?.as_deref() == Some(year.as_str()) {
        return Ok(());
    }
    ctx.database.set_bot_setting(BIRTHDAY_ANNOUNCED_KEY, &year).await?;

    let mut admins: Vec<u64> = ctx.config.admin_ids.clone();
    admins.extend(
        ctx.users
            .all()
            .into_iter()
            .filter(|u| u.role == Role::Admin)
            .map(|u| u.id),
    );
    admins.sort_unstable();
    admins.dedup();

    for admin in &admins {
        if let Err(e) = ctx.notifier.send_to_user(*admin, &ctx.config.birthday_message).await {
            warn!("Birthday greeting to {} failed: {:#}", admin, e);
        }
    }
    info!("Birthday greeting sent to {} admins", admins.len());
    Ok(())
}
