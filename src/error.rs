//! Error types for window bookkeeping
//!
//! Invariant violations (duplicate registration, closing a window that is not
//! live) and fatal configuration errors (content that fails to build) are
//! reported through [`WindowError`]. Timeouts are not errors; see
//! [`crate::manager::AwaitOutcome`].

use crate::window::WindowId;

/// Errors raised by the registry, catalog and manager
#[derive(thiserror::Error, Debug)]
pub enum WindowError {
    /// A window with this identifier is already registered
    #[error("window '{0}' is already registered")]
    DuplicateWindow(WindowId),

    /// A window type with this name is already in the catalog
    #[error("window type '{0}' is already registered in the catalog")]
    DuplicateWindowType(String),

    /// No descriptor or factory is known for this window type
    #[error("unknown window type '{0}'")]
    UnknownWindowType(String),

    /// The window is not live (never shown, or already closed)
    #[error("window '{0}' is not live")]
    WindowNotFound(WindowId),

    /// The window's content could not be built from its asset
    #[error("failed to create content for window '{id}': {source}")]
    ContentCreation {
        /// Window whose content failed
        id: WindowId,
        /// Underlying failure reported by the content
        #[source]
        source: anyhow::Error,
    },
}

/// Result alias used across the crate
pub type Result<T, E = WindowError> = std::result::Result<T, E>;
