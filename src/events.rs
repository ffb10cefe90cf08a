use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{CreditId, OrderId, OrderStatus, UserId};

/// notification-worthy facts emitted after state changes commit
///
/// Events are the outbox toward the chat platform: delivery is best-effort
/// and happens strictly after the mutation that produced them, so a failed
/// send can never roll back ledger or order state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // wallet events
    PermanentCreditAdded {
        user_id: UserId,
        amount: Money,
        new_balance: Money,
        timestamp: DateTime<Utc>,
    },
    TemporaryCreditGranted {
        user_id: UserId,
        credit_id: CreditId,
        amount: Money,
        expires_at: DateTime<Utc>,
        description: String,
        timestamp: DateTime<Utc>,
    },
    WalletPaymentApplied {
        user_id: UserId,
        order_id: OrderId,
        applied_amount: Money,
        remaining_due: Money,
        timestamp: DateTime<Utc>,
    },
    CreditExpired {
        user_id: UserId,
        credit_id: CreditId,
        forfeited_balance: Money,
        timestamp: DateTime<Utc>,
    },

    // order events
    OrderCreated {
        order_id: OrderId,
        user_id: UserId,
        final_price: Money,
        timestamp: DateTime<Utc>,
    },
    OrderRepriced {
        order_id: OrderId,
        total_price: Money,
        discount_amount: Money,
        final_price: Money,
        timestamp: DateTime<Utc>,
    },
    OrderStatusChanged {
        order_id: OrderId,
        user_id: UserId,
        old_status: OrderStatus,
        new_status: OrderStatus,
        timestamp: DateTime<Utc>,
    },
    OrderDeleted {
        order_id: OrderId,
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },

    // campaign events
    CampaignCreditGranted {
        user_id: UserId,
        amount: Money,
        expires_at: Option<DateTime<Utc>>,
        aggregated_spend: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
