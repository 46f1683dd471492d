//! Error types for feed operations.

use thiserror::Error;

/// Network-level failures while fetching a page or a spreadsheet.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {0} timed out")]
    Timeout(String),
}

impl TransportError {
    pub(crate) fn from_reqwest(url: &url::Url, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(url.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            TransportError::Request {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// The listing page no longer has the expected layout.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Main content block not found on {0}")]
    MissingMainBlock(String),

    #[error("Pagination not found on {0}")]
    MissingPagination(String),

    #[error("Pagination loops back to {0}")]
    PaginationLoop(String),

    #[error("Invalid link {href:?} on {page}: {reason}")]
    InvalidLink {
        page: String,
        href: String,
        reason: String,
    },

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// A spreadsheet or one of its worksheets could not be turned into a rate.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unreadable workbook: {0}")]
    Workbook(String),

    #[error("Worksheet {sheet:?}: cell {cell:?} is missing")]
    MissingCell { sheet: String, cell: (u32, u32) },

    #[error("Worksheet {sheet:?}: invalid date {value:?}")]
    InvalidDate { sheet: String, value: String },

    #[error("Worksheet {sheet:?}: invalid rate value {value:?}")]
    InvalidValue { sheet: String, value: String },
}

/// Errors that can occur while collecting rates.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FeedError {
    /// Returns true if this error is transient and likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Transport(TransportError::Client(_)) => false,
            FeedError::Transport(TransportError::Status { status, .. }) => {
                *status >= 500 || *status == 429
            }
            FeedError::Transport(_) => true,
            FeedError::Discovery(_) | FeedError::Parse(_) => false,
        }
    }
}
