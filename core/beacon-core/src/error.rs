//! Error types for beacon-core operations.

use beacon_presence_protocol::FrameError;
use std::path::PathBuf;

/// All errors that can occur in beacon-core and the daemon built on it.
///
/// Provider failures are deliberately absent: the composer converts them into
/// a fallback status and they never propagate past it.
#[derive(Debug, thiserror::Error)]
pub enum BeaconError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors (fatal at startup only)
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Configuration field missing or unset: {0}")]
    ConfigFieldMissing(String),

    // ─────────────────────────────────────────────────────────────────────
    // Transport Errors (fatal to the current session)
    // ─────────────────────────────────────────────────────────────────────
    #[error("No presence endpoint accepted a connection; is the chat client running?")]
    EndpointUnavailable,

    #[error("Handshake rejected by peer: code {code}: {message}")]
    HandshakeRejected { code: String, message: String },

    #[error("Not connected; connect() must succeed before update()")]
    NotConnected,

    #[error("Frame transport failed: {0}")]
    Transport(#[from] FrameError),

    // ─────────────────────────────────────────────────────────────────────
    // Protocol Errors (recovered by the orchestrator)
    // ─────────────────────────────────────────────────────────────────────
    #[error("Presence update rejected by peer: {0}")]
    UpdateRejected(String),

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using BeaconError.
pub type Result<T> = std::result::Result<T, BeaconError>;
