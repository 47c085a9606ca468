//! Repository seam for the order aggregate.
//!
//! The trait is storage-agnostic; the SQLite implementation lives in the store
//! crate. Errors are the repository's public contract and map one-to-one onto
//! HTTP statuses at the API boundary.

use async_trait::async_trait;
use thiserror::Error;

use orderdesk_core::OrderId;

use crate::order::{NewOrder, Order};

pub type RepositoryResult<T> = Result<T, OrderRepositoryError>;

/// Failure modes of the order repository.
#[derive(Debug, Error)]
pub enum OrderRepositoryError {
    /// The requested order aggregate does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// A caller-supplied argument violated the repository contract.
    #[error("argument out of range: {0}")]
    OutOfRange(&'static str),

    /// Data-integrity or write failure inside the storage layer.
    #[error("repository failure: {message}")]
    Repository {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl OrderRepositoryError {
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
            source: None,
        }
    }

    pub fn wrap(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Repository {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Persistence operations for order aggregates.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Load one order with every cross-reference resolved (customer, employee,
    /// shipper, and per-line product with category and supplier).
    ///
    /// Fails with [`OrderRepositoryError::OrderNotFound`] for non-positive ids
    /// without touching storage, and for ids with no matching row.
    async fn get_order(&self, order_id: OrderId) -> RepositoryResult<Order>;

    /// List up to `count` order identities starting at offset `skip`, in
    /// insertion order. Bare identities only; callers needing the aggregate
    /// re-fetch through [`get_order`](Self::get_order).
    async fn list_orders(&self, skip: i64, count: i64) -> RepositoryResult<Vec<OrderId>>;

    /// Persist a new aggregate inside a single transaction, creating missing
    /// reference rows on demand, and return the storage-assigned id.
    async fn add_order(&self, order: &NewOrder) -> RepositoryResult<OrderId>;

    /// Replace an existing order wholesale: all scalar and reference fields are
    /// overwritten and the detail set is deleted and re-inserted.
    async fn update_order(&self, order_id: OrderId, order: &NewOrder) -> RepositoryResult<()>;

    /// Delete an order and its detail lines.
    async fn remove_order(&self, order_id: OrderId) -> RepositoryResult<()>;
}
