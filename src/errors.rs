//! Errors that can happen when delivering lines with `bevy_typewriter`.

use thiserror::Error;

/// Errors an [`ActionMarkupHandler`](crate::prelude::ActionMarkupHandler) can report
/// while a character is about to appear.
///
/// The typewriter never propagates these: a [`HandlerError::Cancelled`] is swallowed
/// silently and a [`HandlerError::Failed`] is logged, then the next handler runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler observed the cancellation token and stopped waiting early.
    #[error("the handler was cancelled")]
    Cancelled,
    /// The handler could not perform its action.
    #[error("the handler failed: {0}")]
    Failed(String),
}

/// Errors when loading [`TypewriterSettings`](crate::prelude::TypewriterSettings) assets.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsLoaderError {
    /// An [IO Error](std::io::Error)
    #[error("Could not read the file: {0}")]
    Io(#[from] std::io::Error),
    /// A [RON Error](serde_ron::error::SpannedError)
    #[error("Could not parse RON: {0}")]
    RonError(#[from] serde_ron::error::SpannedError),
}
