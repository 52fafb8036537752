//! # agent-mcp
//!
//! Process-per-capability tool hosting. Each capability runs as a separate
//! worker process that exchanges line-delimited JSON-RPC 2.0 over its
//! standard streams.
//!
//! ## Lifecycle
//!
//! ```text
//! spawn ──▶ tools/list (id 1) ──▶ first stdout line ──▶ ready
//!                                      │
//!                          demultiplexing reader ──▶ pending calls by id
//! ```
//!
//! The manager side lives in [`manager`] and [`worker`]; worker binaries
//! serve their tools with [`endpoint::serve_stdio`].

pub mod endpoint;
pub mod error;
pub mod manager;
pub mod protocol;
pub mod worker;

pub use error::{Result, WorkerError};
pub use manager::{LaunchSpec, ManagerConfig, ProcessManager, WorkerStatus};
pub use worker::WorkerHandle;
