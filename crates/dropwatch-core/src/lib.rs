//! dropwatch-core: pure domain model for the stream selection scheduler.
//! Campaign/selection types, slug normalization, the tick cadence planner and
//! the configuration model. No async, no IO.

pub mod cadence;
pub mod config;
pub mod slug;
pub mod types;

pub use cadence::{CadenceConfig, TickCounter, TickPlan};
pub use config::{ConfigError, WatcherConfig};
pub use slug::slugify;
pub use types::{Campaign, Selection, SelectionSource, WatchStatus};
