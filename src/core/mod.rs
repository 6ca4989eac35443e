//! Core types for depmap
//!
//! This module holds the error handling shared by every other module:
//! - [`DepmapError`] - Enumerated error types for caller-visible failures
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format
//!
//! # Examples
//!
//! ```rust
//! use depmap_cli::core::{DepmapError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(DepmapError::EmptyPackageName.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{DepmapError, ErrorContext, user_friendly_error};
