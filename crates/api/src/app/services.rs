use std::sync::Arc;

use orderdesk_orders::OrderRepository;
use orderdesk_store::{SqliteOrderRepository, Store};

/// Shared state injected into every handler.
pub struct AppServices {
    pub orders: Arc<dyn OrderRepository>,
}

impl AppServices {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }
}

/// Open the database, apply the schema, and wire the repository.
pub async fn build_services(database_url: &str) -> anyhow::Result<AppServices> {
    let store = Store::connect(database_url).await?;
    store.migrate().await?;

    Ok(AppServices::new(Arc::new(SqliteOrderRepository::new(
        store.pool().clone(),
    ))))
}
