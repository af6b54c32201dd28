//! Fragment translation with bisection on overflow.
//!
//! [`translate_multiple`] fans a list of fragments out to concurrent
//! [`translate_one`] calls and folds their statuses into one `Split` node.
//! When the model rejects a fragment as too long, [`translate_one`] splits it
//! in half and recurses through [`translate_multiple`], so the status tree
//! grows as fragments are subdivided.

use futures_util::future::{BoxFuture, join_all};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

use super::client::ApiCaller;
use super::status::{Settled, Status, StatusFn, extract_errors};
use crate::config::Config;
use crate::markdown::split_at_blank_lines;

/// Separator placed between translated fragments.
const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Errors that mean "this text is too much for one request".
fn is_recoverable(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("reduce the length") || message.contains("stream read error")
}

fn is_recoverable_status(status: &Status) -> bool {
    matches!(status, Status::Error { message } if is_recoverable(message))
}

fn is_recoverable_settled(settled: &Settled) -> bool {
    matches!(settled, Settled::Error { message } if is_recoverable(message))
}

/// Translates one fragment, bisecting it when the model reports an overflow.
///
/// Recoverable errors are never forwarded to `on_status`; only the result of
/// the bisection is. A fragment that cannot be split (a lone code block, for
/// instance) is returned untranslated as `Done`.
pub fn translate_one<'a>(
    caller: &'a dyn ApiCaller,
    text: &'a str,
    config: &'a Config,
    on_status: &'a StatusFn<'a>,
    signal: &'a CancellationToken,
) -> BoxFuture<'a, Settled> {
    Box::pin(async move {
        on_status(Status::Waiting);

        let forward = |status: Status| {
            if !is_recoverable_status(&status) {
                on_status(status);
            }
        };
        let settled = caller.call(text, config, &forward, signal).await;
        if !is_recoverable_settled(&settled) {
            return settled;
        }

        let Some(halves) = split_at_blank_lines(text, 0) else {
            tracing::debug!("fragment cannot be split further, keeping it as is");
            let settled = Settled::done(text);
            on_status(settled.clone().into());
            return settled;
        };
        tracing::debug!(
            lines = text.split('\n').count(),
            "fragment too long, splitting in half"
        );
        translate_multiple(caller, &halves, config, on_status, signal).await
    })
}

/// Translates `fragments` concurrently and joins the results in order.
///
/// Every child update re-emits a `Split` status holding a fresh snapshot of
/// all members. When any child settles with an error, the remaining children
/// are cancelled. The aggregate is `Done` only if every member is `Done`;
/// otherwise it is an `Error` listing every error message in the tree.
pub fn translate_multiple<'a>(
    caller: &'a dyn ApiCaller,
    fragments: &'a [String],
    config: &'a Config,
    on_status: &'a StatusFn<'a>,
    signal: &'a CancellationToken,
) -> BoxFuture<'a, Settled> {
    Box::pin(async move {
        let members = Mutex::new(vec![Status::Waiting; fragments.len()]);
        let group = signal.child_token();

        on_status(Status::Split {
            members: vec![Status::Waiting; fragments.len()],
        });

        let update = |index: usize, status: Status| {
            let is_error = status.is_error();
            let snapshot = {
                let mut members = members.lock().unwrap_or_else(PoisonError::into_inner);
                members[index] = status;
                members.clone()
            };
            on_status(Status::Split { members: snapshot });
            if is_error && !group.is_cancelled() {
                tracing::debug!(fragment = index, "fragment failed, cancelling siblings");
                group.cancel();
            }
        };

        let children = fragments.iter().enumerate().map(|(index, fragment)| {
            let update = &update;
            let group = &group;
            async move {
                let on_child = move |status: Status| update(index, status);
                let settled = translate_one(caller, fragment, config, &on_child, group).await;
                update(index, settled.into());
            }
        });
        join_all(children).await;

        let members = members.into_inner().unwrap_or_else(PoisonError::into_inner);
        let settled = aggregate(&members);
        on_status(settled.clone().into());
        settled
    })
}

fn aggregate(members: &[Status]) -> Settled {
    let translations: Option<Vec<&str>> = members
        .iter()
        .map(|m| match m {
            Status::Done { translation } => Some(translation.as_str()),
            _ => None,
        })
        .collect();

    if let Some(translations) = translations {
        return Settled::done(translations.join(FRAGMENT_SEPARATOR));
    }

    let errors: Vec<String> = members.iter().flat_map(extract_errors).collect();
    if errors.is_empty() {
        Settled::error("aborted")
    } else {
        Settled::error(errors.join("\n"))
    }
}
