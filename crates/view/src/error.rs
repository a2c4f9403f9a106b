//! View-side error types.

use std::time::Duration;
use thiserror::Error;

/// Startup failures of an app instance.
///
/// None of these are retried. An instance that hits one stays failed until it
/// is recreated.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("connection to host failed: {0}")]
    Connection(String),

    #[error("timed out connecting to host after {0:?}")]
    ConnectTimeout(Duration),

    #[error("failed to load widget scripts: {0}")]
    ScriptLoad(String),

    #[error("widget container not found: {0}")]
    MissingAnchor(String),

    #[error("failed to construct widget: {0}")]
    Construction(String),

    #[error("widget bootstrap timed out after {0:?}")]
    BootstrapTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
