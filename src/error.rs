use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal input problems; the run aborts before any navigation
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read input file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no valid URL in {}", .0.display())]
    NoValidUrls(PathBuf),
}

/// Why a page could not be loaded
#[derive(Debug, Clone, Error)]
pub enum NavigationCause {
    #[error("navigation timeout after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Driver(String),
}

/// A page failed to load under both wait strategies, or could not be harvested
#[derive(Debug, Clone, Error)]
#[error("navigation to {url} failed: {cause}")]
pub struct NavigationError {
    pub url: String,
    pub cause: NavigationCause,
}

impl NavigationError {
    pub fn timeout(url: &str, after: Duration) -> Self {
        Self {
            url: url.to_string(),
            cause: NavigationCause::Timeout(after),
        }
    }

    pub fn driver(url: &str, err: impl std::fmt::Display) -> Self {
        Self {
            url: url.to_string(),
            cause: NavigationCause::Driver(err.to_string()),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, NavigationCause::Timeout(_))
    }
}

/// Recoverable extraction problems. Resolvers log these and move on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{field} candidate {value} rejected")]
    Validation { field: &'static str, value: String },
}
