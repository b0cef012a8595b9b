use thiserror::Error;

/// Failure of a single image transform. Always returned, never raised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("input image file does not exist: {0}")]
    InputMissing(String),
    #[error("logo file does not exist: {0}")]
    LogoMissing(String),
    #[error("error opening input image: {0}")]
    Decode(String),
    #[error("error processing logo: {0}")]
    Compose(String),
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Reasons a selection event cannot advance a group.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid selection token: {0}")]
    InvalidSelection(String),
    #[error("no media group found for group_id={0}")]
    StaleGroup(String),
    #[error("group {0} was already dispatched")]
    Duplicate(String),
    #[error("event {event} does not apply to group {group} in state {state}")]
    OutOfOrder {
        group: String,
        event: &'static str,
        state: &'static str,
    },
}

impl SelectionError {
    /// Whether this error tears the conversation down. Only a re-delivered
    /// event for a dispatched group is swallowed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Duplicate(_))
    }
}

/// Log the full context chain of an error and hand it back.
pub fn handle_error(error: anyhow::Error) -> anyhow::Error {
    let chain = error
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n  caused by: ");
    error!("{}", chain);
    error
}
