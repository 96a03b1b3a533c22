use super::TransitionError;
use diesel_derive_enum::DbEnum;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ExistingTypePath = "crate::schema::sql_types::OrderType"]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
pub enum OrderType {
    /// Dine-in, bound to a table of the restaurant.
    Table,
    /// Pickup.
    Preorder,
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ExistingTypePath = "crate::schema::sql_types::OrderStatus"]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
pub enum OrderStatus {
    Received,
    InPrep,
    Ready,
    OutForDelivery,
    Completed,
    Delivered,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "RECEIVED",
            OrderStatus::InPrep => "IN_PREP",
            OrderStatus::Ready => "READY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Delivered
                | OrderStatus::Cancelled
                | OrderStatus::Failed
        )
    }

    /// Statuses that a driver reports through the delivery assignment.
    pub fn is_driver_reported(&self) -> bool {
        matches!(
            self,
            OrderStatus::OutForDelivery | OrderStatus::Delivered | OrderStatus::Failed
        )
    }

    /// Whether an order of `order_type` sitting in `self` may move to `to`.
    ///
    /// Dine-in and pickup orders finish at `COMPLETED`; delivery orders leave
    /// the kitchen through `OUT_FOR_DELIVERY` and finish at `DELIVERED` or `FAILED`.
    pub fn can_transition(&self, order_type: OrderType, to: OrderStatus) -> bool {
        use OrderStatus::*;
        let is_delivery = order_type == OrderType::Delivery;
        match (self, to) {
            (Received, InPrep) | (Received, Cancelled) => true,
            (InPrep, Ready) | (InPrep, Cancelled) => true,
            (Ready, Completed) => !is_delivery,
            (Ready, OutForDelivery) => is_delivery,
            (OutForDelivery, Delivered) | (OutForDelivery, Failed) => is_delivery,
            _ => false,
        }
    }

    pub fn transition(
        &self,
        order_type: OrderType,
        to: OrderStatus,
    ) -> Result<OrderStatus, TransitionError> {
        if self.can_transition(order_type, to) {
            Ok(to)
        } else {
            Err(TransitionError::new("order", self, to))
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ORDER_CODE_LEN: usize = 8;

/// Human-facing order reference, e.g. `ORD-7KQ2M9XA`.
pub fn generate_order_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_CODE_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("ORD-{}", suffix)
}
