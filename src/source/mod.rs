pub mod dominos;

use crate::error::FetchError;
use crate::types::OrderSnapshot;
use async_trait::async_trait;

/// Abstraction over the order-tracking backend so the polling loop can be
/// driven by stubs in tests.
#[async_trait]
pub trait TrackerSource: Send + Sync {
    /// One fetch-and-parse round trip for the given store/order.
    async fn fetch(&self, store_id: &str, order_key: &str) -> Result<OrderSnapshot, FetchError>;
}

pub use dominos::TrackerClient;
