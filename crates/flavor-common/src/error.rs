//! Error types shared by the flavor crates.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for flavor operations
#[derive(Debug, Error, Diagnostic)]
pub enum FlavorError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Auth(#[from] AuthStoreError),
}

/// Failures talking to the hosted journal workflows.
///
/// `Rejected` carries the message the remote side reported and displays it
/// verbatim, so callers can surface it to the user as-is.
#[derive(Debug, Error, Diagnostic)]
pub enum RemoteError {
    #[error("{0}")]
    #[diagnostic(code(flavor::remote::rejected))]
    Rejected(String),

    #[error("request to {url} failed")]
    #[diagnostic(code(flavor::remote::transport))]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    #[diagnostic(code(flavor::remote::status))]
    Status { url: String, status: http::StatusCode },

    #[error("could not decode response from {url}")]
    #[diagnostic(code(flavor::remote::decode))]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration loading errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing environment variable {var}")]
    #[diagnostic(
        code(flavor::config::missing_env),
        help("set the variable in the environment or in a .env file")
    )]
    MissingEnv { var: &'static str },

    #[error("invalid URL {url}: {message}")]
    #[diagnostic(code(flavor::config::url))]
    UrlParse { url: String, message: String },

    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(flavor::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    #[diagnostic(code(flavor::config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported config format for {}", path.display())]
    #[diagnostic(code(flavor::config::format), help("only .json config files are supported"))]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid HTTP client configuration")]
    #[diagnostic(code(flavor::config::client))]
    Client(#[source] reqwest::Error),
}

/// Errors reading or writing the saved login.
#[derive(Debug, Error, Diagnostic)]
pub enum AuthStoreError {
    #[error("no platform config directory available")]
    #[diagnostic(code(flavor::auth::no_dir), help("pass an explicit session file path"))]
    NoConfigDir,

    #[error("failed to access session file {}", path.display())]
    #[diagnostic(code(flavor::auth::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {} is corrupt", path.display())]
    #[diagnostic(code(flavor::auth::corrupt), help("log in again to replace it"))]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_remote_message_verbatim() {
        let err = RemoteError::Rejected("duplicate title".into());
        assert_eq!(err.to_string(), "duplicate title");
    }

    #[test]
    fn status_error_mentions_url() {
        let err = RemoteError::Status {
            url: "https://example.test/create".into(),
            status: http::StatusCode::BAD_GATEWAY,
        };
        let message = err.to_string();
        assert!(message.contains("https://example.test/create"));
        assert!(message.contains("502"));
    }
}
