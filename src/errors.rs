//! Error Types
//!
//! This module defines the error types used throughout the viewer.
//!
//! # Overview
//!
//! Two layers of errors exist:
//! - [`AssetError`] covers everything that can go wrong while fetching and
//!   decoding a model file.
//! - [`ViewerError`] is what the controller reports: load failures (wrapping an
//!   [`AssetError`] together with the animation that was requested), mixer
//!   setup failures, a missing mount surface, and rejected commands.
//!
//! None of these are fatal to the process. The controller records them in its
//! [`DiagnosticLog`](crate::viewer::DiagnosticLog) and keeps the previously
//! displayed model on screen.
//!
//! # Usage
//!
//! ```rust,ignore
//! use skinview::errors::{Result, ViewerError};
//!
//! fn pick(controller: &mut AnimationController) -> Result<()> {
//!     controller.select_animation("Walking")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Failures raised while reading or decoding a model asset.
///
/// The variants carry plain strings so the error can be cloned into the
/// controller state and the diagnostic log.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    // ========================================================================
    // I/O & Network
    // ========================================================================
    /// The requested asset does not exist at the given location.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Local file I/O failed.
    #[error("IO error reading {path}: {message}")]
    Io {
        /// Path that was being read
        path: String,
        /// Underlying error message
        message: String,
    },

    /// The server answered with a non-success status code.
    #[error("HTTP response error for {url}: status {status}")]
    Http {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The request could not be completed (DNS, connection, CORS, ...).
    #[error("Network error: {0}")]
    Network(String),

    // ========================================================================
    // Format & Parsing
    // ========================================================================
    /// glTF parsing or validation error.
    #[error("glTF error: {0}")]
    Gltf(String),

    /// A buffer referenced by the document could not be resolved.
    #[error("Missing buffer {index}: {reason}")]
    MissingBuffer {
        /// Buffer index inside the glTF document
        index: usize,
        /// Why the buffer is unavailable
        reason: String,
    },

    /// Data URI parsing error.
    #[error("Data URI error: {0}")]
    DataUri(String),

    // ========================================================================
    // Task lifecycle
    // ========================================================================
    /// The load task was dropped before it produced a result.
    #[error("Load cancelled")]
    Cancelled,
}

impl From<gltf::Error> for AssetError {
    fn from(err: gltf::Error) -> Self {
        AssetError::Gltf(err.to_string())
    }
}

impl From<base64::DecodeError> for AssetError {
    fn from(err: base64::DecodeError) -> Self {
        AssetError::DataUri(err.to_string())
    }
}

/// Why a mixer could not be built for a freshly loaded model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The asset does not contain any animation clip.
    #[error("asset contains no animation clips")]
    NoClips,

    /// The first clip has no track that targets a node of the model.
    #[error("clip '{clip}' has no track bound to the model")]
    NoBindings {
        /// Name of the clip that could not be bound
        clip: String,
    },
}

/// The main error type reported by the viewer controller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    // ========================================================================
    // Lifecycle failures (recovered locally)
    // ========================================================================
    /// Fetching or decoding the asset for an animation failed.
    #[error("Failed to load animation '{animation_id}': {source}")]
    Load {
        /// Animation whose asset was requested
        animation_id: String,
        /// Underlying asset error
        #[source]
        source: AssetError,
    },

    /// The model loaded but its mixer could not be constructed.
    #[error("Failed to set up animation '{animation_id}': {reason}")]
    Setup {
        /// Animation whose clip could not be played
        animation_id: String,
        /// What was missing
        #[source]
        reason: SetupError,
    },

    /// The mount surface is missing; the viewer cannot start.
    #[error("Environment error: {0}")]
    Environment(String),

    // ========================================================================
    // Command validation
    // ========================================================================
    /// The id does not name any known animation descriptor.
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),

    /// Speeds must be finite and strictly positive.
    #[error("Invalid playback speed: {0}")]
    InvalidSpeed(f32),

    /// The controller was already torn down.
    #[error("Viewer has been torn down")]
    TornDown,

    // ========================================================================
    // Configuration
    // ========================================================================
    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ViewerError {
    /// The animation this error is about, if any.
    #[must_use]
    pub fn animation_id(&self) -> Option<&str> {
        match self {
            ViewerError::Load { animation_id, .. } | ViewerError::Setup { animation_id, .. } => {
                Some(animation_id)
            }
            ViewerError::UnknownAnimation(id) => Some(id),
            _ => None,
        }
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        ViewerError::Config(err.to_string())
    }
}

/// Alias for `Result<T, ViewerError>`.
pub type Result<T> = std::result::Result<T, ViewerError>;
