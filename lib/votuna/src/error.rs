use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotAuthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{}", too_many_items_message(.requested, .limit))]
    TooManyItems {
        requested: Option<u32>,
        limit: Option<u32>,
    },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Client is not configured: missing base URL")]
    NotConfigured,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Transfer panel has shut down")]
    PanelClosed,
}

fn too_many_items_message(requested: &Option<u32>, limit: &Option<u32>) -> String {
    match (*requested, *limit) {
        (Some(requested), Some(limit)) => format!(
            "Selection has {requested} songs. Narrow your selection to {limit} songs or fewer."
        ),
        (None, Some(limit)) => format!(
            "Too many songs for one action. Narrow your selection to {limit} songs or fewer."
        ),
        _ => "Too many songs for one action. Narrow your selection and try again.".to_string(),
    }
}

/// Coarse error category, for callers that branch on the kind rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotAuthorized,
    NotFound,
    TooManyItems,
    Transport,
    Config,
    Closed,
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Validation(_) => ErrorKind::Validation,
            TransferError::NotAuthorized(_) => ErrorKind::NotAuthorized,
            TransferError::NotFound(_) => ErrorKind::NotFound,
            TransferError::TooManyItems { .. } => ErrorKind::TooManyItems,
            TransferError::Transport(_) => ErrorKind::Transport,
            TransferError::NotConfigured | TransferError::Config(_) => ErrorKind::Config,
            TransferError::PanelClosed => ErrorKind::Closed,
        }
    }
}

impl From<reqwest::Error> for TransferError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransferError::Transport("request timed out".to_string())
        } else {
            TransferError::Transport(e.to_string())
        }
    }
}

impl From<url::ParseError> for TransferError {
    fn from(e: url::ParseError) -> Self {
        TransferError::Config(format!("invalid URL: {e}"))
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(e: serde_json::Error) -> Self {
        TransferError::Transport(format!("JSON parse error: {e}"))
    }
}

/// A failure as shown to the user: the message plus its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&TransferError> for ErrorReport {
    fn from(e: &TransferError) -> Self {
        ErrorReport {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_items_is_actionable() {
        let err = TransferError::TooManyItems {
            requested: Some(600),
            limit: Some(500),
        };
        assert_eq!(err.kind(), ErrorKind::TooManyItems);
        assert!(err.to_string().contains("600 songs"));
        assert!(err.to_string().contains("500 songs or fewer"));

        let unknown = TransferError::TooManyItems {
            requested: None,
            limit: None,
        };
        assert!(unknown.to_string().starts_with("Too many songs"));
    }

    #[test]
    fn test_report_keeps_message_verbatim() {
        let err = TransferError::NotAuthorized("Only the playlist owner can copy songs".into());
        let report = ErrorReport::from(&err);
        assert_eq!(report.kind, ErrorKind::NotAuthorized);
        assert_eq!(report.message, "Only the playlist owner can copy songs");
    }
}
