//! # beacon-core
//!
//! Core library for Beacon: fuses raw desktop signals into one activity
//! snapshot, composes a short status line from it, and owns the configuration
//! model shared by every surface.
//!
//! ## Design Principles
//!
//! - **Synchronous**: no async runtime dependency. The daemon provides the
//!   loop and all transport I/O; this crate holds the logic.
//! - **Graceful degradation**: a missing signal is an empty field, a failed
//!   provider call is a fallback status. Only configuration errors at load
//!   time are fatal.
//! - **Immutable snapshots**: fusion always builds a fresh [`Context`]; a
//!   snapshot is never mutated after construction.

pub mod cache;
pub mod compose;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod fusion;
pub mod patterns;
pub mod persona;
pub mod provider;

pub use cache::{EngineStats, StatusCache};
pub use compose::{direct_status, StatusComposer, MAX_STATUS_LEN};
pub use config::{Config, ConfigManager};
pub use context::Context;
pub use error::{BeaconError, Result};
pub use events::{EventBus, LogEvent};
pub use fusion::{fuse, SignalSource};
pub use provider::{ProviderKind, TextProvider};
