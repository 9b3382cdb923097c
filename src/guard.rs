//! Catch-and-log boundary shared by the router and the job runner.
//!
//! Both errors and panics stop here: the failure is logged with a label and
//! the caller gets `None` back so it can decide what, if anything, to tell
//! the user.

use futures::FutureExt;
use log::error;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Run `fut` to completion, logging and swallowing any error or panic
pub async fn contain<T, F>(label: &str, fut: F) -> Option<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!("{label} failed: {e:#}");
            None
        }
        Err(panic) => {
            error!("{label} panicked: {}", panic_message(panic.as_ref()));
            None
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
