use super::{OrderStatus, TransitionError};
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ExistingTypePath = "crate::schema::sql_types::DeliveryStatus"]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
pub enum DeliveryStatus {
    Pending,
    Accepted,
    Declined,
    PickedUp,
    OutForDelivery,
    Delivered,
    Failed,
    /// Set when the order is cancelled; never requested by a driver.
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Accepted => "ACCEPTED",
            DeliveryStatus::Declined => "DECLINED",
            DeliveryStatus::PickedUp => "PICKED_UP",
            DeliveryStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Failed => "FAILED",
            DeliveryStatus::Cancelled => "CANCELLED",
        }
    }

    pub const ACTIVE: [DeliveryStatus; 4] = [
        DeliveryStatus::Pending,
        DeliveryStatus::Accepted,
        DeliveryStatus::PickedUp,
        DeliveryStatus::OutForDelivery,
    ];

    /// An active assignment still holds the order; only one may exist per order.
    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn can_transition(&self, to: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, to),
            (Pending, Accepted)
                | (Pending, Declined)
                | (Accepted, PickedUp)
                | (PickedUp, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (OutForDelivery, Failed)
        )
    }

    pub fn transition(&self, to: DeliveryStatus) -> Result<DeliveryStatus, TransitionError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(TransitionError::new("delivery assignment", self, to))
        }
    }

    /// The order status that follows from reaching this assignment status.
    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            DeliveryStatus::OutForDelivery => Some(OrderStatus::OutForDelivery),
            DeliveryStatus::Delivered => Some(OrderStatus::Delivered),
            DeliveryStatus::Failed => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
