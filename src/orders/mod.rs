pub mod pricing;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{Result, StoreError};
use crate::types::{OrderId, OrderStatus, UserId};

pub use pricing::{PricingEngine, PricingOutcome};

/// one order line; `unit_price` is a fixed per-unit value, never re-derived
/// from the quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: u64,
    pub pack_id: u64,
    pub product_name: String,
    pub pack_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// a customer order
///
/// Totals are maintained by the pricing engine; the invariants
/// `final_price = max(0, total_price - discount_amount)` and
/// `remaining_due = max(0, final_price - wallet_payment_amount)` hold after
/// every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub total_price: Money,
    pub discount_code: Option<String>,
    pub discount_amount: Money,
    pub final_price: Money,
    pub wallet_payment_amount: Money,
    pub remaining_due: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Order {
    /// expiry is derived at read time, never a stored transition
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(deadline) => now > deadline && !self.status.is_terminal(),
            None => false,
        }
    }

    /// deletion is permitted only in non-terminal states
    pub fn can_delete(&self) -> bool {
        !self.status.is_terminal()
    }

    fn ensure_editable(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.status.allows_item_edits() {
            return Err(StoreError::OrderNotEditable {
                status: self.status,
            });
        }
        if self.is_expired(now) {
            return Err(StoreError::OrderExpired { order_id: self.id });
        }
        Ok(())
    }

    /// set the exact quantity of one line; zero removes the line
    pub fn set_item_quantity(
        &mut self,
        index: usize,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_editable(now)?;
        if index >= self.items.len() {
            return Err(StoreError::ItemIndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        if quantity == 0 {
            return self.remove_item(index, now);
        }
        self.items[index].quantity = quantity;
        Ok(())
    }

    /// bump one line's quantity by a signed delta; reaching zero removes the
    /// line
    pub fn adjust_item_quantity(
        &mut self,
        index: usize,
        delta: i32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_editable(now)?;
        if index >= self.items.len() {
            return Err(StoreError::ItemIndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let quantity = (self.items[index].quantity as i64 + delta as i64)
            .clamp(0, u32::MAX as i64) as u32;
        self.set_item_quantity(index, quantity, now)
    }

    /// remove one line; the last remaining line is protected, callers must
    /// reject the whole order instead
    pub fn remove_item(&mut self, index: usize, now: DateTime<Utc>) -> Result<()> {
        self.ensure_editable(now)?;
        if index >= self.items.len() {
            return Err(StoreError::ItemIndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        if self.items.len() == 1 {
            return Err(StoreError::LastItemRemoval { order_id: self.id });
        }
        self.items.remove(index);
        Ok(())
    }

    /// admin approval: pending -> waiting_payment
    pub fn approve(&mut self) -> Result<()> {
        self.transition_from(&[OrderStatus::Pending], OrderStatus::WaitingPayment)
    }

    /// customer sent a payment receipt: waiting_payment -> receipt_sent
    pub fn attach_receipt(&mut self) -> Result<()> {
        self.transition_from(&[OrderStatus::WaitingPayment], OrderStatus::ReceiptSent)
    }

    /// admin accepted the receipt: receipt_sent -> payment_confirmed
    pub fn accept_receipt(&mut self) -> Result<()> {
        self.transition_from(&[OrderStatus::ReceiptSent], OrderStatus::PaymentConfirmed)
    }

    /// admin rejected the receipt and wants a new one:
    /// receipt_sent -> waiting_payment
    pub fn reject_receipt(&mut self) -> Result<()> {
        self.transition_from(&[OrderStatus::ReceiptSent], OrderStatus::WaitingPayment)
    }

    /// admin direct confirmation, terminal
    pub fn confirm(&mut self) -> Result<()> {
        self.transition_from(
            &[
                OrderStatus::Pending,
                OrderStatus::WaitingPayment,
                OrderStatus::ReceiptSent,
            ],
            OrderStatus::Confirmed,
        )
    }

    /// admin rejection, terminal
    pub fn reject(&mut self) -> Result<()> {
        self.transition_from(
            &[OrderStatus::Pending, OrderStatus::WaitingPayment],
            OrderStatus::Rejected,
        )
    }

    /// pretty-printed json snapshot of the order
    pub fn json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    /// book an applied wallet amount against the order
    pub(crate) fn record_wallet_payment(&mut self, applied: Money) {
        self.wallet_payment_amount += applied;
        self.remaining_due = self.final_price.saturating_sub(self.wallet_payment_amount);
    }

    fn transition_from(&mut self, allowed: &[OrderStatus], to: OrderStatus) -> Result<()> {
        if !allowed.contains(&self.status) {
            return Err(StoreError::OrderNotEditable {
                status: self.status,
            });
        }
        self.status = to;
        Ok(())
    }
}
