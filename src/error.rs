//! Error types for the replier.
//!
//! The classification pipeline itself is total and never returns these; they
//! cover configuration and the two I/O collaborators around it.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse keyword file {path}: {reason}")]
    KeywordFile { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mail transport errors (IMAP fetch, SMTP send).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("IMAP command {command} failed: {response}")]
    Imap { command: String, response: String },

    #[error("IMAP connection closed unexpectedly")]
    Closed,

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Send(String),

    #[error("Transport task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Draft persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Failed to write draft {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create drafts directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the replier.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_top_level() {
        let err: Error = ConfigError::MissingEnvVar("EMAIL_ADDRESS".into()).into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("EMAIL_ADDRESS"));
    }

    #[test]
    fn imap_error_display_names_command() {
        let err = TransportError::Imap {
            command: "LOGIN".into(),
            response: "A1 NO [AUTHENTICATIONFAILED]".into(),
        };
        let display = err.to_string();
        assert!(display.contains("LOGIN"));
        assert!(display.contains("AUTHENTICATIONFAILED"));
    }
}
