//! Version expression parsing for registry lookups.
//!
//! A version expression is whatever a package declares for one of its
//! dependencies: an exact version (`1.2.3`), a range (`^1.2.3`, `>=1.0.0 <2.0.0`,
//! `~1.2.*`) or a dist-tag (`latest`, `next`). depmap does no range arithmetic of
//! its own. Instead it extracts a concrete search token from the expression and
//! lets the registry do the resolving:
//!
//! - If the expression contains a `MAJOR.MINOR.PATCH` version (patch may be `*`,
//!   optionally followed by pre-release and build metadata), the first such
//!   substring becomes the search token.
//! - Otherwise the expression is sent to the registry unchanged.
//!
//! | Expression        | Search token |
//! |-------------------|--------------|
//! | `1.2.3`           | `1.2.3`      |
//! | `^1.2.3`          | `1.2.3`      |
//! | `~1.2.*`          | `1.2.*`      |
//! | `>=1.0.0 <2.0.0`  | `1.0.0`      |
//! | `1.0.0-beta.1+b7` | `1.0.0-beta.1+b7` |
//! | `latest`          | `latest`     |
//! | `^1.2`            | `^1.2`       |
//!
//! # Examples
//!
//! ```rust
//! use depmap_cli::version::Version;
//!
//! let version = Version::parse("^4.17.1")?;
//! assert_eq!(version.original_expression(), "^4.17.1");
//! assert_eq!(version.search_expression(), "4.17.1");
//! assert!(version.minimal_version().is_none());
//! # Ok::<(), depmap_cli::core::DepmapError>(())
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::core::DepmapError;

/// Concrete semantic version, anywhere in the expression.
const SEMVER_CAPTURE: &str = r"(?:0|[1-9]\d*)\.(?:0|[1-9]\d*)\.(?:0|[1-9]\d*|\*)(?:-[\da-z-]+(?:\.[\da-z-]+)*)?(?:\+[\da-z-]+(?:\.[\da-z-]+)*)?";

fn semver_capture() -> &'static Regex {
    static SEMVER: OnceLock<Regex> = OnceLock::new();
    SEMVER.get_or_init(|| Regex::new(SEMVER_CAPTURE).expect("SEMVER_CAPTURE is a valid regex"))
}

/// Extract the registry search token from a version expression.
///
/// Returns the first concrete semantic version found in `expression`, or the
/// whole expression when there is none.
#[must_use]
pub fn search_token(expression: &str) -> &str {
    semver_capture().find(expression).map_or(expression, |m| m.as_str())
}

/// A version expression together with the version the registry resolved it to.
///
/// `search_expression` is always derived from `original_expression`;
/// `minimal_version` is filled in exactly once, by [`Version::resolved`], after
/// a registry lookup or cache hit.
///
/// On the wire only `originalExpression` and `minimalVersion` are exposed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VersionRepr", into = "VersionRepr")]
pub struct Version {
    original_expression: String,
    search_expression: String,
    minimal_version: Option<String>,
}

impl Version {
    /// Parse a version expression.
    ///
    /// # Errors
    ///
    /// Returns [`DepmapError::EmptyVersion`] if `expression` is empty.
    pub fn parse(expression: &str) -> Result<Self, DepmapError> {
        if expression.is_empty() {
            return Err(DepmapError::EmptyVersion);
        }

        Ok(Self {
            original_expression: expression.to_string(),
            search_expression: search_token(expression).to_string(),
            minimal_version: None,
        })
    }

    /// A version that could not be parsed, kept verbatim so it can still be
    /// reported on a leaf node.
    pub(crate) fn unparsed(expression: &str) -> Self {
        Self {
            original_expression: expression.to_string(),
            search_expression: expression.to_string(),
            minimal_version: None,
        }
    }

    /// Record the concrete version the registry resolved this expression to.
    #[must_use]
    pub fn resolved(self, minimal_version: impl Into<String>) -> Self {
        Self {
            minimal_version: Some(minimal_version.into()),
            ..self
        }
    }

    /// The exact expression the caller supplied.
    pub fn original_expression(&self) -> &str {
        &self.original_expression
    }

    /// The literal token submitted to the registry.
    pub fn search_expression(&self) -> &str {
        &self.search_expression
    }

    /// The concrete version reported by the registry, if resolved.
    pub fn minimal_version(&self) -> Option<&str> {
        self.minimal_version.as_deref()
    }

    /// Key used for cache lookups: the resolved version when known, else the
    /// search token.
    pub fn cache_key(&self) -> &str {
        self.minimal_version.as_deref().unwrap_or(&self.search_expression)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.minimal_version {
            Some(resolved) if resolved != &self.original_expression => {
                write!(f, "{resolved} ({})", self.original_expression)
            }
            Some(resolved) => write!(f, "{resolved}"),
            None => write!(f, "{}", self.original_expression),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionRepr {
    original_expression: String,
    #[serde(default)]
    minimal_version: Option<String>,
}

impl TryFrom<VersionRepr> for Version {
    type Error = DepmapError;

    fn try_from(repr: VersionRepr) -> Result<Self, Self::Error> {
        // Trees carry unresolved leaves for empty child expressions.
        let version = if repr.original_expression.is_empty() {
            Self::unparsed("")
        } else {
            Self::parse(&repr.original_expression)?
        };
        Ok(match repr.minimal_version {
            Some(resolved) => version.resolved(resolved),
            None => version,
        })
    }
}

impl From<Version> for VersionRepr {
    fn from(version: Version) -> Self {
        Self {
            original_expression: version.original_expression,
            minimal_version: version.minimal_version,
        }
    }
}
