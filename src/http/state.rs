//! Application state for the HTTP server.

use crate::api::StockPolicy;
use crate::db::repository::FullRepository;
use std::sync::Arc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Policy applied when orders decrement product stock
    pub stock_policy: StockPolicy,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn FullRepository>, stock_policy: StockPolicy) -> Self {
        Self {
            repository,
            stock_policy,
        }
    }
}
