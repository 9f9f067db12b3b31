// Snapshots, change detection and aggregation

mod aggregator;
mod detector;
mod entity;

pub use aggregator::Aggregator;
pub use detector::ChangeDetector;
pub use entity::{Attributes, ChangeRecord, Snapshot};

#[cfg(test)]
mod tests;
