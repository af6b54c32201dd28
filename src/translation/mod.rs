mod client;
mod lines;
mod prompt;
mod rate_limit;
mod sse_parser;
mod status;
mod translate;

pub use client::{
    ApiCaller, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_RETRY, LENGTH_EXCEEDED_MESSAGE,
    STREAM_READ_ERROR_MESSAGE, TranslationClient,
};
pub use lines::lines;
pub use rate_limit::{RateLimited, RateLimiter, limit_call_rate};
pub use status::{Settled, Status, StatusFn, extract_errors, status_to_text};
pub use translate::{translate_multiple, translate_one};
