//! Spacing out API call starts.

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::client::ApiCaller;
use super::status::{Settled, Status, StatusFn};
use crate::config::Config;

/// Lets at most one operation start per interval.
///
/// Waiters are served in arrival order (the queue is the fair lock). Only
/// starts are spaced; a started operation runs concurrently with later ones
/// and its outcome has no effect on the schedule.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_start: Mutex::new(None),
        }
    }

    /// Waits until the caller may start its operation.
    pub async fn wait_turn(&self) {
        let mut next_start = self.next_start.lock().await;
        if let Some(at) = *next_start {
            tokio::time::sleep_until(at).await;
        }
        *next_start = Some(Instant::now() + self.interval);
    }
}

/// An [`ApiCaller`] whose calls start at most once per interval.
pub struct RateLimited<C: ?Sized> {
    limiter: RateLimiter,
    inner: Arc<C>,
}

impl<C: ApiCaller + ?Sized> ApiCaller for RateLimited<C> {
    fn call<'a>(
        &'a self,
        text: &'a str,
        config: &'a Config,
        on_status: &'a StatusFn<'a>,
        signal: &'a CancellationToken,
    ) -> BoxFuture<'a, Settled> {
        Box::pin(async move {
            tokio::select! {
                () = self.limiter.wait_turn() => {}
                () = signal.cancelled() => {
                    on_status(Status::Aborted);
                    return Settled::Aborted;
                }
            }
            self.inner.call(text, config, on_status, signal).await
        })
    }
}

/// Wraps `caller` so that calls start at least `interval_secs` seconds apart.
///
/// A non-positive interval returns `caller` unchanged.
///
/// # Errors
///
/// Returns an error if the interval is not a finite number of seconds that
/// fits in a [`Duration`].
pub fn limit_call_rate(
    caller: Arc<dyn ApiCaller>,
    interval_secs: f64,
) -> Result<Arc<dyn ApiCaller>> {
    if interval_secs <= 0.0 {
        return Ok(caller);
    }
    let interval = Duration::try_from_secs_f64(interval_secs)
        .with_context(|| format!("Invalid API call interval: {interval_secs}"))?;
    Ok(Arc::new(RateLimited {
        limiter: RateLimiter::new(interval),
        inner: caller,
    }))
}
