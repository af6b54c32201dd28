//! Translation status tree.
//!
//! Every fragment reports its progress as a [`Status`]. When a fragment is
//! subdivided, its status becomes a [`Status::Split`] holding one child status
//! per part, so the whole document forms a tree that the UI reduces to a
//! single line with [`status_to_text`].

/// Observer invoked with every status change.
///
/// Observers are called synchronously from the task that produced the event
/// and must not block.
pub type StatusFn<'a> = dyn Fn(Status) + Send + Sync + 'a;

/// The state of one fragment, or of a group of fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Scheduled, no activity yet.
    Waiting,
    /// Streaming; `last_token` is the most recently received chunk.
    Pending { last_token: String },
    /// Subdivided; `members` are the child statuses in fragment order.
    Split { members: Vec<Self> },
    /// Finished successfully.
    Done { translation: String },
    /// Finished with a failure.
    Error { message: String },
    /// Cancelled by the caller.
    Aborted,
}

/// A terminal status. Exactly one is produced per translation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Done { translation: String },
    Error { message: String },
    Aborted,
}

impl Status {
    pub fn pending(last_token: impl Into<String>) -> Self {
        Self::Pending {
            last_token: last_token.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Counts `(done, total)` leaves of the tree.
    ///
    /// A split node counts as its members; any other node is one leaf.
    pub fn progress(&self) -> (usize, usize) {
        match self {
            Self::Split { members } => members
                .iter()
                .map(Self::progress)
                .fold((0, 0), |(d, t), (md, mt)| (d + md, t + mt)),
            Self::Done { .. } => (1, 1),
            _ => (0, 1),
        }
    }
}

impl Settled {
    pub fn done(translation: impl Into<String>) -> Self {
        Self::Done {
            translation: translation.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<Settled> for Status {
    fn from(settled: Settled) -> Self {
        match settled {
            Settled::Done { translation } => Self::Done { translation },
            Settled::Error { message } => Self::Error { message },
            Settled::Aborted => Self::Aborted,
        }
    }
}

/// Collects every error message in the tree, depth first, in member order.
pub fn extract_errors(status: &Status) -> Vec<String> {
    match status {
        Status::Error { message } => vec![message.clone()],
        Status::Split { members } => members.iter().flat_map(extract_errors).collect(),
        _ => Vec::new(),
    }
}

/// Reduces a status tree to a short, single-line display string.
pub fn status_to_text(status: &Status) -> String {
    match status {
        Status::Waiting => "⏳".to_string(),
        Status::Pending { last_token } if last_token.is_empty() => "⚡".to_string(),
        Status::Pending { last_token } => format!("⚡ {}", last_token.replace('\n', " ")),
        Status::Split { members } => format!(
            "[{}]",
            members
                .iter()
                .map(status_to_text)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Status::Done { .. } => "✅".to_string(),
        Status::Error { message } => format!("❌ {message}"),
        Status::Aborted => "🛑".to_string(),
    }
}
