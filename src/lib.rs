// Configuration (TOML sections, shared connection settings)
pub mod config;

// Entity keys and player identity
pub mod entity;

// One-shot hub events
pub mod event;

// Read-only world-state queries
pub mod world;

// Snapshots, change detection and aggregation
pub mod state;

// Update throttle window
pub mod throttle;

// Batch dispatch and transport seam
pub mod dispatch;

// Attribute trackers
pub mod tracker;

// Tick scheduler wiring trackers to the dispatcher
pub mod pipeline;

pub use config::BridgeConfig;
pub use dispatch::{Dispatcher, Submission, Transport};
pub use entity::{EntityKey, PlayerId};
pub use event::HubEvent;
pub use pipeline::Pipeline;
pub use world::{LifecycleSignal, World, WorldFrame};
