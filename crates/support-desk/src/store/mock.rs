//! Mock Support Store
//!
//! Static demo data: two customers and their three orders.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::SupportStore;
use crate::error::{Result, SupportError};
use crate::model::{Customer, CustomerTier, Order, OrderStatus, OrderSummary};

/// In-memory store seeded with demo records
pub struct MockSupportStore {
    customers: HashMap<String, Customer>,
    orders: HashMap<String, Order>,
}

impl Default for MockSupportStore {
    fn default() -> Self {
        Self::new()
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn summary(id: &str, status: OrderStatus, placed: NaiveDate) -> OrderSummary {
    OrderSummary {
        id: id.into(),
        status,
        date: placed,
    }
}

impl MockSupportStore {
    pub fn new() -> Self {
        let customers = [
            Customer {
                id: "CUST-12345".into(),
                name: "John Doe".into(),
                email: "john.doe@example.com".into(),
                tier: CustomerTier::Premium,
                join_date: date(2023, 6, 15),
                orders: vec![
                    summary("ORD-001", OrderStatus::Delivered, date(2024, 11, 20)),
                    summary("ORD-002", OrderStatus::Pending, date(2024, 11, 28)),
                ],
            },
            Customer {
                id: "CUST-67890".into(),
                name: "Jane Smith".into(),
                email: "jane.smith@example.com".into(),
                tier: CustomerTier::Basic,
                join_date: date(2024, 1, 10),
                orders: vec![summary("ORD-003", OrderStatus::Shipped, date(2024, 11, 29))],
            },
        ];

        let orders = [
            Order {
                id: "ORD-001".into(),
                items: vec!["Laptop Stand".into(), "Wireless Mouse".into()],
                total: dec!(79.99),
                status: OrderStatus::Delivered,
                tracking_number: "TRK-1111111111".into(),
                estimated_delivery: date(2024, 11, 22),
            },
            Order {
                id: "ORD-002".into(),
                items: vec!["Wireless Headphones".into(), "USB-C Cable".into()],
                total: dec!(89.99),
                status: OrderStatus::Pending,
                tracking_number: "TRK-9876543210".into(),
                estimated_delivery: date(2024, 12, 5),
            },
            Order {
                id: "ORD-003".into(),
                items: vec!["Mechanical Keyboard".into()],
                total: dec!(129.99),
                status: OrderStatus::Shipped,
                tracking_number: "TRK-5555555555".into(),
                estimated_delivery: date(2024, 12, 3),
            },
        ];

        Self {
            customers: customers.into_iter().map(|c| (c.email.clone(), c)).collect(),
            orders: orders.into_iter().map(|o| (o.id.clone(), o)).collect(),
        }
    }
}

#[async_trait]
impl SupportStore for MockSupportStore {
    async fn find_customer(&self, email: &str) -> Result<Customer> {
        self.customers
            .get(email)
            .cloned()
            .ok_or_else(|| SupportError::CustomerNotFound(email.to_string()))
    }

    async fn find_order(&self, order_id: &str) -> Result<Order> {
        self.orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| SupportError::OrderNotFound(order_id.to_string()))
    }

    fn name(&self) -> &str {
        "MockSupportStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_mock_store() {
        let store = MockSupportStore::new();

        let john = store.find_customer("john.doe@example.com").await.unwrap();
        assert_eq!(john.id, "CUST-12345");
        assert_eq!(john.orders.len(), 2);

        let order = store.find_order("ORD-002").await.unwrap();
        assert_eq!(order.tracking_number, "TRK-9876543210");
        assert!(order.total > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_every_listed_order_exists() {
        let store = MockSupportStore::new();
        for email in ["john.doe@example.com", "jane.smith@example.com"] {
            let customer = store.find_customer(email).await.unwrap();
            for listed in &customer.orders {
                let order = store.find_order(&listed.id).await.unwrap();
                assert_eq!(order.status, listed.status);
            }
        }
    }

    #[tokio::test]
    async fn test_lookup_misses() {
        let store = MockSupportStore::new();
        assert!(store.find_customer("JOHN.DOE@example.com").await.unwrap_err().is_not_found());
        assert!(store.find_order("ORD-999").await.unwrap_err().is_not_found());
    }
}
