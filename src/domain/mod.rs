pub mod delivery;
pub mod order;
pub mod pricing;
pub mod reservation;
pub mod role;
pub mod table;

pub use delivery::DeliveryStatus;
pub use order::{generate_order_code, OrderStatus, OrderType};
pub use pricing::{OrderLine, OrderPricing, PricingSettings};
pub use reservation::ReservationStatus;
pub use role::{EmploymentStatus, Role, StaffRole};
pub use table::TableState;

use thiserror::Error;

/// A requested state change that the entity's lifecycle does not allow.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{entity} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
}

impl TransitionError {
    pub fn new(entity: &'static str, from: impl ToString, to: impl ToString) -> Self {
        Self {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
