use super::OrderType;
use serde::{Deserialize, Serialize};

/// Fees applied on top of the item subtotal, in XAF.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PricingSettings {
    pub delivery_fee: i64,
    pub service_fee: i64,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            delivery_fee: 1500,
            service_fee: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrderLine {
    pub unit_price: i64,
    pub quantity: i32,
}

impl OrderLine {
    pub fn subtotal(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderPricing {
    pub subtotal: i64,
    pub service_fee: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
}

impl OrderPricing {
    pub fn compute(
        order_type: OrderType,
        lines: &[OrderLine],
        fees: &PricingSettings,
    ) -> Result<OrderPricing, String> {
        if lines.is_empty() {
            return Err("An order needs at least one item.".to_string());
        }
        let mut subtotal: i64 = 0;
        for line in lines {
            if line.quantity < 1 {
                return Err(format!("{} is not a valid quantity.", line.quantity));
            }
            if line.unit_price < 0 {
                return Err(format!("{} is not a valid price.", line.unit_price));
            }
            subtotal = line
                .subtotal()
                .and_then(|amount| subtotal.checked_add(amount))
                .ok_or_else(|| "Order amount is too large.".to_string())?;
        }

        let delivery_fee = match order_type {
            OrderType::Delivery => fees.delivery_fee,
            OrderType::Table | OrderType::Preorder => 0,
        };
        let service_fee = fees.service_fee;
        let total_amount = subtotal
            .checked_add(service_fee)
            .and_then(|amount| amount.checked_add(delivery_fee))
            .ok_or_else(|| "Order amount is too large.".to_string())?;

        Ok(OrderPricing {
            subtotal,
            service_fee,
            delivery_fee,
            total_amount,
        })
    }
}
