use anyhow::{Context, Result};
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::lines::lines;
use super::prompt::{Message, build_messages};
use super::sse_parser::{SseEvent, parse_sse_line};
use super::status::{Settled, Status, StatusFn};
use crate::config::Config;

/// Retries allowed for transient API errors and stalled streams.
pub const DEFAULT_MAX_RETRY: u32 = 2;

/// A stream that receives nothing for this long is aborted.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

const WATCHDOG_TICK: Duration = Duration::from_secs(1);

/// Message returned when the model stops at its output length limit.
pub const LENGTH_EXCEEDED_MESSAGE: &str = "reduce the length.";

/// Message returned when the response stream breaks off.
pub const STREAM_READ_ERROR_MESSAGE: &str = "stream read error";

/// Something that can translate one piece of text with a remote model.
///
/// Implementations report progress through `on_status` and always settle;
/// failures are returned as [`Settled::Error`], never as panics or `Err`.
/// Cancelling `signal` must make the call settle promptly.
pub trait ApiCaller: Send + Sync {
    fn call<'a>(
        &'a self,
        text: &'a str,
        config: &'a Config,
        on_status: &'a StatusFn<'a>,
        signal: &'a CancellationToken,
    ) -> BoxFuture<'a, Settled>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: [Message<'a>; 4],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Why a single request did not produce a translation.
#[derive(Debug)]
enum Failure {
    /// Cancelled, either by the caller or by the idle watchdog.
    Interrupted,
    Network(String),
    Http { message: String, retryable: bool },
    StreamRead,
    LengthExceeded,
}

enum Outcome {
    Settled(Settled),
    Retry,
}

/// Tracks when data was last received on a stream.
struct IdleClock {
    started: Instant,
    last_ms: AtomicU64,
}

impl IdleClock {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            last_ms: AtomicU64::new(0),
        }
    }

    fn touch(&self) {
        let elapsed = self.started.elapsed().as_millis() as u64;
        self.last_ms.store(elapsed, Ordering::Relaxed);
    }

    fn idle(&self) -> Duration {
        let elapsed = self.started.elapsed().as_millis() as u64;
        Duration::from_millis(elapsed.saturating_sub(self.last_ms.load(Ordering::Relaxed)))
    }
}

/// Streaming client for OpenAI-compatible chat completion endpoints.
pub struct TranslationClient {
    client: Client,
    endpoint: String,
    api_key: String,
    max_retry: u32,
    idle_timeout: Duration,
}

impl TranslationClient {
    /// Creates a client posting to `endpoint`, optionally through a proxy.
    ///
    /// The proxy is used for both `http` and `https` endpoints.
    pub fn new(endpoint: String, api_key: String, https_proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(proxy) = https_proxy {
            builder = builder.proxy(
                Proxy::all(proxy).with_context(|| format!("Invalid HTTPS proxy: {proxy}"))?,
            );
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            max_retry: DEFAULT_MAX_RETRY,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        })
    }

    #[must_use]
    pub const fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    async fn translate(
        &self,
        text: &str,
        config: &Config,
        on_status: &StatusFn<'_>,
        signal: &CancellationToken,
    ) -> Settled {
        let mut retries_left = self.max_retry;
        loop {
            match self
                .attempt(text, config, on_status, signal, retries_left)
                .await
            {
                Outcome::Settled(settled) => {
                    on_status(settled.clone().into());
                    return settled;
                }
                Outcome::Retry => {
                    tracing::debug!(retries_left, "retrying chat completion request");
                    on_status(Status::pending(format!("(Retrying {retries_left})")));
                    retries_left -= 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        text: &str,
        config: &Config,
        on_status: &StatusFn<'_>,
        signal: &CancellationToken,
        retries_left: u32,
    ) -> Outcome {
        on_status(Status::pending(""));

        let request = signal.child_token();
        let clock = IdleClock::new();

        let result = tokio::select! {
            () = request.cancelled() => Err(Failure::Interrupted),
            () = self.watch_idle(&clock, &request) => Err(Failure::Interrupted),
            result = self.exchange(text, config, on_status, &clock) => result,
        };

        let caller_cancelled = signal.is_cancelled();
        let settled = match result {
            Ok(translation) => Settled::Done { translation },
            Err(Failure::Interrupted) if caller_cancelled => Settled::Aborted,
            Err(Failure::Interrupted) if retries_left > 0 => {
                tracing::warn!("no data received for {:?}, aborting request", self.idle_timeout);
                return Outcome::Retry;
            }
            Err(Failure::Http { retryable: true, .. }) if retries_left > 0 && !caller_cancelled => {
                return Outcome::Retry;
            }
            Err(Failure::Interrupted | Failure::StreamRead) => {
                Settled::error(STREAM_READ_ERROR_MESSAGE)
            }
            Err(Failure::LengthExceeded) => Settled::error(LENGTH_EXCEEDED_MESSAGE),
            Err(Failure::Http { message, .. } | Failure::Network(message)) => {
                Settled::error(message)
            }
        };
        Outcome::Settled(settled)
    }

    /// Cancels `request` once the stream has been idle for too long.
    async fn watch_idle(&self, clock: &IdleClock, request: &CancellationToken) {
        let period = WATCHDOG_TICK
            .min(self.idle_timeout)
            .max(Duration::from_millis(10));
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if clock.idle() > self.idle_timeout {
                request.cancel();
                return;
            }
        }
    }

    /// Sends one request and reads the whole response stream.
    async fn exchange(
        &self,
        text: &str,
        config: &Config,
        on_status: &StatusFn<'_>,
        clock: &IdleClock,
    ) -> Result<String, Failure> {
        let body = ChatCompletionRequest {
            model: &config.model,
            temperature: config.temperature,
            messages: build_messages(&config.prompt, text),
            stream: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Failure::Network(e.to_string()))?;
        clock.touch();

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or_else(|_| format!("HTTP {status}: {body}"), |r| r.error.message);
            let retryable = message.contains("You can retry");
            return Err(Failure::Http { message, retryable });
        }

        let mut stream = std::pin::pin!(lines(response.bytes_stream()));
        let mut translation = String::new();

        while let Some(line_result) = stream.next().await {
            clock.touch();
            let line = line_result.map_err(|e| {
                tracing::debug!("stream error: {e}");
                Failure::StreamRead
            })?;

            match parse_sse_line(&line) {
                Ok(SseEvent::Skip) => {}
                Ok(SseEvent::Done) => break,
                Ok(SseEvent::LengthExceeded) => return Err(Failure::LengthExceeded),
                Ok(SseEvent::Token(token)) => {
                    translation.push_str(&token);
                    on_status(Status::Pending { last_token: token });
                }
                Err(e) => {
                    tracing::debug!("{e:#}");
                    return Err(Failure::StreamRead);
                }
            }
        }

        Ok(translation)
    }
}

impl ApiCaller for TranslationClient {
    fn call<'a>(
        &'a self,
        text: &'a str,
        config: &'a Config,
        on_status: &'a StatusFn<'a>,
        signal: &'a CancellationToken,
    ) -> BoxFuture<'a, Settled> {
        Box::pin(self.translate(text, config, on_status, signal))
    }
}
