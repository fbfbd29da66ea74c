//! Error types for mapfeed.
//!
//! Defines the error codes and the error type shared by the fetcher,
//! the map layers and the CLI.

use std::fmt;

/// Error codes identifying the failure class.
///
/// These codes let callers decide whether to retry, fix their input or
/// give up, without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The HTTP request could not be sent or its body could not be read.
    /// Trigger: DNS failure, refused connection, timeout.
    RequestFailed,

    /// The service answered with a non-success status.
    /// Trigger: 4xx/5xx response.
    HttpStatus,

    /// The response body is not a usable feature page.
    /// Trigger: Malformed JSON, missing `features`, invalid link href.
    InvalidResponse,

    /// A bounding box could not be parsed or is degenerate.
    /// Trigger: Wrong number of values, non-numeric values, min > max.
    InvalidBbox,

    /// Configuration is invalid.
    /// Trigger: Bad endpoint URL, unreadable collections file.
    InvalidConfig,

    /// Local I/O failed.
    /// Trigger: Output file could not be written.
    Io,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RequestFailed => "REQUEST_FAILED",
            ErrorCode::HttpStatus => "HTTP_STATUS",
            ErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ErrorCode::InvalidBbox => "INVALID_BBOX",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::Io => "IO",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::RequestFailed => "The feature service could not be reached",
            ErrorCode::HttpStatus => "The feature service returned an error status",
            ErrorCode::InvalidResponse => "The feature service returned an unusable page",
            ErrorCode::InvalidBbox => "Bounding box must be min_lon,min_lat,max_lon,max_lat",
            ErrorCode::InvalidConfig => "Configuration is invalid",
            ErrorCode::Io => "Local file operation failed",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::RequestFailed => {
                "Check the network connection and the endpoint URL, \
                 or raise MAPFEED_TIMEOUT for slow services"
            }
            ErrorCode::HttpStatus => {
                "Verify the collection name and query parameters, \
                 or try again later if the service is unavailable"
            }
            ErrorCode::InvalidResponse => {
                "Make sure the endpoint serves GeoJSON feature collections \
                 (OGC API Features items)"
            }
            ErrorCode::InvalidBbox => {
                "Pass four comma-separated numbers with min values first \
                 (e.g., 24.93,60.16,24.96,60.18)"
            }
            ErrorCode::InvalidConfig => {
                "Fix the MAPFEED_* environment variables or the collections JSON file"
            }
            ErrorCode::Io => "Check that the output path exists and is writable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for mapfeed operations.
#[derive(Debug)]
pub struct MapError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MapError {
    /// Creates a new MapError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new MapError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a REQUEST_FAILED error.
    pub fn request_failed(url: &str, source: reqwest::Error) -> Self {
        Self::with_source(
            ErrorCode::RequestFailed,
            format!("Request to {} failed: {}", url, source),
            source,
        )
    }

    /// Creates an HTTP_STATUS error.
    pub fn http_status(url: &str, status: reqwest::StatusCode) -> Self {
        Self::new(ErrorCode::HttpStatus, format!("HTTP {} for {}", status, url))
    }

    /// Creates an INVALID_RESPONSE error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidResponse,
            format!("Invalid feature page: {}", reason.into()),
        )
    }

    /// Creates an INVALID_BBOX error.
    pub fn invalid_bbox(input: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidBbox,
            format!("Invalid bbox '{}': {}", input, reason.into()),
        )
    }

    /// Creates an INVALID_CONFIG error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, reason.into())
    }

    /// Creates an IO error.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        let context = context.into();
        Self::with_source(ErrorCode::Io, format!("{}: {}", context, source), source)
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using MapError.
pub type Result<T> = std::result::Result<T, MapError>;
