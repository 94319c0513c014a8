//! Error types for the VDOS dashboard
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - A single human-readable status line for the dashboard
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Transport errors (3xx)
    TransportFailed = 300,
    TransportTimeout = 301,

    // Simulation API errors (4xx)
    ApiClientError = 400,
    ApiServerError = 401,
    ApiMalformed = 402,

    // Local validation errors (5xx)
    ValidationFailed = 500,
    PersonaInvalid = 501,
    PlaybookInvalid = 502,

    // Draft project errors (6xx)
    DraftIndexOutOfRange = 600,
    NoTeamsAvailable = 601,
    AuthoringState = 602,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Transport errors
            400..=499 => 40, // API errors
            500..=599 => 50, // Validation errors
            600..=699 => 60, // Draft errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the dashboard
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────

    /// Request never produced an HTTP response
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Request timed out
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    // ─────────────────────────────────────────────────────────────
    // Simulation API Errors
    // ─────────────────────────────────────────────────────────────

    /// Non-2xx response; message is the body, or the status text if empty
    #[error("Simulation server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Malformed response from {endpoint}: {message}")]
    ApiMalformed { endpoint: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Local Validation Errors
    // ─────────────────────────────────────────────────────────────

    /// Operator input rejected before any network call
    #[error("{message}")]
    Validation { message: String, field: Option<String> },

    /// Persona form is missing required content
    #[error("{reason}")]
    PersonaInvalid { reason: String },

    /// Event playbook text is not a JSON object of string lists
    #[error("Invalid event playbook JSON")]
    PlaybookInvalid {
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // Draft Project Errors
    // ─────────────────────────────────────────────────────────────

    /// Draft index outside the current list
    #[error("No draft project at index {index} ({len} drafts)")]
    DraftIndexOutOfRange { index: usize, len: usize },

    /// Team selection requested with an empty roster
    #[error("No teams available. Please create personas with team assignments first.")]
    NoTeamsAvailable,

    /// Authoring step invoked in the wrong state
    #[error("Cannot {action} while draft authoring is {state}")]
    AuthoringState { action: &'static str, state: &'static str },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::Transport { .. } => ErrorCode::TransportFailed,
            Error::Timeout { .. } => ErrorCode::TransportTimeout,

            Error::Api { status, .. } if *status >= 500 => ErrorCode::ApiServerError,
            Error::Api { .. } => ErrorCode::ApiClientError,
            Error::ApiMalformed { .. } => ErrorCode::ApiMalformed,

            Error::Validation { .. } => ErrorCode::ValidationFailed,
            Error::PersonaInvalid { .. } => ErrorCode::PersonaInvalid,
            Error::PlaybookInvalid { .. } => ErrorCode::PlaybookInvalid,

            Error::DraftIndexOutOfRange { .. } => ErrorCode::DraftIndexOutOfRange,
            Error::NoTeamsAvailable => ErrorCode::NoTeamsAvailable,
            Error::AuthoringState { .. } => ErrorCode::AuthoringState,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// True for failures caught before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self.code() as u16,
            100..=299 | 500..=699
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    /// The single line shown on the dashboard status surface
    ///
    /// API errors show the server's own message without decoration.
    pub fn status_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'vdos-dashboard config init' to create a default configuration file.",
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'vdos-dashboard config validate' to see details.",
            ),
            Error::ConfigValidation { .. } => {
                Some("Review the configuration file and fix the invalid values.")
            }
            Error::Transport { .. } => Some(
                "Check that the simulation server is running and that server.base_url is correct.",
            ),
            Error::Timeout { .. } => Some(
                "The simulation server is slow to answer. Raise server.request_timeout_secs if this persists.",
            ),
            Error::Api { status, .. } if *status >= 500 => {
                Some("The simulation server failed internally. Check its logs.")
            }
            Error::PlaybookInvalid { .. } => Some(
                "The event playbook must be a JSON object mapping event types to lists of responses.",
            ),
            Error::NoTeamsAvailable => {
                Some("Create personas first; personas without a team are grouped under 'No Team'.")
            }
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", self.code().as_str(), self);

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a local validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a local validation error tied to one input field
    pub fn field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transport {
            url: url.into(),
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::TransportFailed.as_str(), "E300");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::TransportFailed.exit_code(), 30);
        assert_eq!(ErrorCode::ApiClientError.exit_code(), 40);
        assert_eq!(ErrorCode::ValidationFailed.exit_code(), 50);
        assert_eq!(ErrorCode::NoTeamsAvailable.exit_code(), 60);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_api_error_split_by_status() {
        assert_eq!(Error::api(409, "already running").code(), ErrorCode::ApiClientError);
        assert_eq!(Error::api(503, "busy").code(), ErrorCode::ApiServerError);
    }

    #[test]
    fn test_status_message_uses_server_text() {
        let err = Error::api(400, "Simulation already running");
        assert_eq!(err.status_message(), "Simulation already running");

        let err = Error::validation("Specify at least one skill.");
        assert_eq!(err.status_message(), "Specify at least one skill.");
    }

    #[test]
    fn test_local_classification() {
        assert!(Error::validation("x").is_local());
        assert!(Error::NoTeamsAvailable.is_local());
        assert!(!Error::api(500, "boom").is_local());
        assert!(!Error::transport("http://x", "refused").is_local());
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/test/dashboard.toml"),
        };
        let formatted = err.format_for_terminal();

        assert!(formatted.contains("E100"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::transport("http://localhost:8015", "connection refused");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E300]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
