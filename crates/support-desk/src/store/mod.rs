//! Customer Data
//!
//! Read access to customers and orders.

mod mock;

pub use mock::MockSupportStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Customer, Order};

/// Customer and order lookups (Strategy pattern)
///
/// Implement this for a real CRM or order database.
#[async_trait]
pub trait SupportStore: Send + Sync {
    /// Customer by email address
    async fn find_customer(&self, email: &str) -> Result<Customer>;

    /// Order by order number
    async fn find_order(&self, order_id: &str) -> Result<Order>;

    /// Store name for logs
    fn name(&self) -> &str;
}
