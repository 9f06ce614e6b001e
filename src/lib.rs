pub mod config;
pub mod error;
pub mod markup;
pub mod poll;
pub mod source;
pub mod stats;
pub mod types;

pub use error::FetchError;
pub use poll::PollingLoop;
pub use source::{TrackerClient, TrackerSource};
pub use types::OrderSnapshot;
