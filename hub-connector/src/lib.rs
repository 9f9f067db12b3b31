//! Hub connector - outbound HTTP for the tickbridge pipeline.
//!
//! The core crate decides *what* to send and *when*; this crate owns the
//! network side and the runnable binary.
//!
//! # Architecture
//!
//! ```text
//!   world frames (replay script)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       tickbridge::Pipeline               │
//! │  - Trackers compute snapshots            │
//! │  - Diff, aggregate, throttle             │
//! └─────────────────────────────────────────┘
//!          ↓  Transport::post(path, body)
//! ┌─────────────────────────────────────────┐
//! │       HubClient                          │
//! │  - Reads shared URL/token per send       │
//! │  - Fire-and-forget POST, no retry        │
//! └─────────────────────────────────────────┘
//!          ↓
//!     Home hub HTTP API
//! ```
//!
//! # Core Types
//!
//! - [`HubClient`] - reqwest-backed [`tickbridge::Transport`]
//! - [`probe::validate_connection`] - user-facing connection check
//! - [`replay::ReplayStep`] - one line of a scripted world replay

pub mod client;
pub mod probe;
pub mod replay;

pub use client::HubClient;
pub use probe::{validate_connection, ProbeReport};
pub use replay::{ReplayStep, ReplaySummary};
