use serde::{Deserialize, Serialize};

/// chat-platform user identifier
pub type UserId = i64;

/// sequential identifier for a temporary credit row
pub type CreditId = u64;

/// sequential identifier for a ledger transaction row
pub type TransactionId = u64;

/// sequential identifier for an order
pub type OrderId = u64;

/// which balance a ledger transaction moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletType {
    /// non-expiring store credit
    Permanent,
    /// gift credit with a fixed expiry
    Temporary,
}

/// order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// created, awaiting admin review
    Pending,
    /// approved, customer owes payment
    WaitingPayment,
    /// customer submitted a payment receipt
    ReceiptSent,
    /// payment verified (receipt accepted or fully covered by wallet)
    PaymentConfirmed,
    /// confirmed directly by an admin
    Confirmed,
    /// rejected by an admin
    Rejected,
}

impl OrderStatus {
    /// terminal orders cannot be deleted or have items mutated
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::PaymentConfirmed | OrderStatus::Rejected
        )
    }

    /// item-level edits are allowed only before payment starts settling
    pub fn allows_item_edits(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::WaitingPayment)
    }

    /// wallet credit may be applied while the order still owes payment
    pub fn allows_wallet_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::WaitingPayment)
    }
}

/// discount code kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// percentage of the order total, optionally capped
    Percentage,
    /// fixed amount off
    Fixed,
}
