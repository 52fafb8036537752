//! Domain Models
//!
//! Customer and order records as the support tools return them. Field names
//! follow the JSON the agent sees (`joinDate`, `trackingNumber`, ...).
//! Order totals use `rust_decimal` and travel as `"$79.99"` strings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Loyalty tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerTier {
    Basic,
    Premium,
}

impl std::fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "Basic"),
            Self::Premium => write!(f, "Premium"),
        }
    }
}

/// Fulfilment state of an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
}

/// An order as listed on a customer record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: String,
    pub status: OrderStatus,
    pub date: NaiveDate,
}

/// A customer record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Customer number (e.g., "CUST-12345")
    pub id: String,
    pub name: String,
    pub email: String,
    pub tier: CustomerTier,
    pub join_date: NaiveDate,
    pub orders: Vec<OrderSummary>,
}

/// Full order details
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order number (e.g., "ORD-001")
    pub id: String,
    pub items: Vec<String>,
    #[serde(with = "usd")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub tracking_number: String,
    pub estimated_delivery: NaiveDate,
}

/// An outgoing message handed to a mailer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Confirmation returned once a message has been accepted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReceipt {
    pub sent: bool,
    /// `MSG-<unix millis>`
    pub message_id: String,
    pub to: String,
    pub subject: String,
}

/// Dollar amounts as `"$12.34"`
mod usd {
    use rust_decimal::Decimal;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("${:.2}", amount.round_dp(2)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.trim_start_matches('$')
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid amount '{text}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_wire_shape() {
        let order = Order {
            id: "ORD-003".into(),
            items: vec!["Mechanical Keyboard".into()],
            total: dec!(129.99),
            status: OrderStatus::Shipped,
            tracking_number: "TRK-5555555555".into(),
            estimated_delivery: NaiveDate::from_ymd_opt(2024, 12, 3).unwrap(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["total"], "$129.99");
        assert_eq!(json["status"], "Shipped");
        assert_eq!(json["trackingNumber"], "TRK-5555555555");
        assert_eq!(json["estimatedDelivery"], "2024-12-03");

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_customer_wire_shape() {
        let json = serde_json::json!({
            "id": "CUST-1",
            "name": "Test",
            "email": "t@example.com",
            "tier": "Premium",
            "joinDate": "2023-06-15",
            "orders": [{"id": "ORD-9", "status": "Pending", "date": "2024-11-28"}]
        });

        let customer: Customer = serde_json::from_value(json).unwrap();
        assert_eq!(customer.tier, CustomerTier::Premium);
        assert_eq!(customer.orders[0].status, OrderStatus::Pending);
    }
}
