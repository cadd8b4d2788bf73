//! Error types for the Discogs export library.

use thiserror::Error;

/// Result type alias using [`DiscogsError`].
pub type Result<T> = std::result::Result<T, DiscogsError>;

/// The main error type for all export operations.
#[derive(Error, Debug)]
pub enum DiscogsError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The token was rejected (401/403). Fatal for the whole run.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication {
        /// HTTP status returned by Discogs
        status: u16,
        /// Message from the response body, if any
        message: String,
    },

    /// The requested resource does not exist (404).
    #[error("Resource not found: {path}")]
    NotFound {
        /// Request path
        path: String,
    },

    /// Two consecutive 429 responses for the same request.
    #[error("Request to {path} was throttled again after cooling down")]
    Throttled {
        /// Request path
        path: String,
    },

    /// Transient failures exhausted the retry budget.
    #[error("Request to {path} failed after {attempts} attempts: {reason}")]
    RequestFailed {
        /// Request path
        path: String,
        /// Number of attempts made, including the first one
        attempts: u32,
        /// Last observed failure
        reason: String,
    },

    /// A listing page reported a different page count than the first page.
    #[error(
        "Listing changed while fetching: page {page} reports {reported} pages, page 1 reported {expected}"
    )]
    PaginationConsistency {
        /// Page on which the conflict was detected
        page: u32,
        /// Total pages reported by page 1
        expected: u32,
        /// Total pages reported by `page`
        reported: u32,
    },

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration or command-line input
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Spreadsheet output failed
    #[error("Failed to write spreadsheet: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled between two API calls
    #[error("Export cancelled")]
    Cancelled,
}

/// Coarse classification of [`DiscogsError`] used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Token rejected by the API.
    Authentication,
    /// Repeated 429 responses.
    Throttling,
    /// Network, 5xx or otherwise failed request.
    Request,
    /// 404 on a lookup.
    NotFound,
    /// Listing changed shape mid-fetch.
    PaginationConsistency,
    /// Invalid user input.
    Configuration,
    /// Spreadsheet or filesystem failure.
    Output,
    /// Interrupted by the user.
    Cancelled,
}

impl ErrorCategory {
    /// Process exit code reported by the binary for this category.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Authentication => 3,
            ErrorCategory::Throttling => 4,
            ErrorCategory::Request | ErrorCategory::NotFound => 5,
            ErrorCategory::PaginationConsistency => 6,
            ErrorCategory::Output => 7,
            ErrorCategory::Cancelled => 130,
        }
    }

    /// Whether an error of this category ends an export.
    ///
    /// Lookup misses are recovered by leaving the item unenriched.
    pub fn is_fatal(self) -> bool {
        !matches!(self, ErrorCategory::NotFound)
    }

    /// Short label printed alongside fatal errors.
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication failure",
            ErrorCategory::Throttling => "throttling failure",
            ErrorCategory::Request => "request failure",
            ErrorCategory::NotFound => "not found",
            ErrorCategory::PaginationConsistency => "pagination consistency fault",
            ErrorCategory::Configuration => "configuration error",
            ErrorCategory::Output => "output error",
            ErrorCategory::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl DiscogsError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DiscogsError::Authentication { .. } => ErrorCategory::Authentication,
            DiscogsError::Throttled { .. } => ErrorCategory::Throttling,
            DiscogsError::NotFound { .. } => ErrorCategory::NotFound,
            DiscogsError::PaginationConsistency { .. } => ErrorCategory::PaginationConsistency,
            DiscogsError::InvalidConfig(_) | DiscogsError::Url(_) => ErrorCategory::Configuration,
            DiscogsError::Export(_) | DiscogsError::Io(_) => ErrorCategory::Output,
            DiscogsError::Cancelled => ErrorCategory::Cancelled,
            DiscogsError::Http(_)
            | DiscogsError::HttpMiddleware(_)
            | DiscogsError::Json(_)
            | DiscogsError::InvalidResponse(_)
            | DiscogsError::RequestFailed { .. } => ErrorCategory::Request,
        }
    }

    /// Check if this is a 404 miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscogsError::NotFound { .. })
    }

    /// Check if this is a repeated-throttling failure.
    pub fn is_throttled(&self) -> bool {
        matches!(self, DiscogsError::Throttled { .. })
    }

    /// Check if this is an authentication failure.
    pub fn is_authentication(&self) -> bool {
        matches!(self, DiscogsError::Authentication { .. })
    }
}
