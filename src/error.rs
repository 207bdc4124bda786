//! Error types for pagination

use thiserror::Error;

/// Errors that can surface from a pagination run.
///
/// Oversize content is not an error; it is reported through
/// [`Page::overflow`](crate::layout::Page::overflow).
#[derive(Error, Debug)]
pub enum Error {
    #[error("markup error: {0}")]
    Markup(String),

    #[error("measurement failed: {0}")]
    Measure(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown reflow trigger '{0}'")]
    Trigger(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
