//! Error handling for depmap
//!
//! This module provides the error types and user-friendly error reporting for
//! depmap. The error system follows two principles:
//! 1. **Strongly-typed errors** for precise error handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`DepmapError`] - Enumerated error types for failures that reach the caller
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! Registry failures have their own type ([`crate::registry::RegistryError`])
//! because they never cross the tree builder: an unreachable package becomes a
//! leaf node instead of failing the request.
//!
//! # Examples
//!
//! ```rust,no_run
//! use depmap_cli::core::{DepmapError, user_friendly_error};
//!
//! let ctx = user_friendly_error(anyhow::Error::from(DepmapError::EmptyVersion));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for depmap operations
///
/// Only pre-flight validation, configuration and server start-up can fail a
/// request. Per-package registry failures are recovered inside the tree builder.
#[derive(Error, Debug)]
pub enum DepmapError {
    /// Package name was empty
    #[error("Package name must not be empty")]
    EmptyPackageName,

    /// Version expression was empty
    ///
    /// Raised by [`crate::version::Version::parse`] before any registry
    /// activity takes place.
    #[error("Version can't be empty")]
    EmptyVersion,

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Config file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the configuration file that was not found
        path: String,
    },

    /// HTTP server failed to start or crashed
    #[error("Server error: {reason}")]
    ServerError {
        /// Reason for the server failure
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl DepmapError {
    /// Whether the error was caused by invalid caller input.
    ///
    /// The HTTP layer maps these to `400 Bad Request`.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::EmptyPackageName | Self::EmptyVersion)
    }
}

impl Clone for DepmapError {
    fn clone(&self) -> Self {
        match self {
            Self::EmptyPackageName => Self::EmptyPackageName,
            Self::EmptyVersion => Self::EmptyVersion,
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::ConfigNotFound {
                path,
            } => Self::ConfigNotFound {
                path: path.clone(),
            },
            Self::ServerError {
                reason,
            } => Self::ServerError {
                reason: reason.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying depmap error
    pub error: DepmapError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`DepmapError`]
    #[must_use]
    pub const fn new(error: DepmapError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`DepmapError`] variants, [`std::io::Error`] and TOML errors
/// anywhere in the error chain; everything else is wrapped as
/// [`DepmapError::Other`] using the full `anyhow` chain as the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(depmap_error) = cause.downcast_ref::<DepmapError>() {
            return create_error_context(depmap_error.clone());
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(DepmapError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check file ownership and permissions of the configuration file");
            }
            std::io::ErrorKind::AddrInUse => {
                return ErrorContext::new(DepmapError::ServerError {
                    reason: format!("{error:#}"),
                })
                .with_suggestion("Choose a different address with --bind or stop the process using the port");
            }
            _ => {}
        }
    }

    if error.chain().any(|cause| cause.downcast_ref::<toml::de::Error>().is_some()) {
        return ErrorContext::new(DepmapError::ConfigError {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check the TOML syntax of the configuration file")
        .with_details("Every key in the depmap configuration is optional; remove keys you are unsure about");
    }

    ErrorContext::new(DepmapError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: DepmapError) -> ErrorContext {
    match &error {
        DepmapError::EmptyPackageName => ErrorContext::new(error)
            .with_suggestion("Pass a package name, e.g. 'depmap tree express 4.18.2'"),

        DepmapError::EmptyVersion => ErrorContext::new(error)
            .with_suggestion("Pass an exact version, a range such as '^1.2.3', or a tag such as 'latest'")
            .with_details("The version expression is resolved by the registry, so tags and ranges are accepted"),

        DepmapError::ConfigNotFound {
            path,
        } => {
            let suggestion = format!("Create {path} or omit --config to use the defaults");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        DepmapError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the values in the depmap configuration file"),

        _ => ErrorContext::new(error),
    }
}
