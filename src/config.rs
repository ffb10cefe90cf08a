use chrono::Duration;
use serde::{Deserialize, Serialize};

/// store-wide limits and defaults
///
/// Inputs arriving from the conversation layer are pre-parsed but not
/// trusted; the core revalidates them against these bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// maximum gift-credit lifetime in days an admin may grant
    pub max_credit_expiry_days: u32,
    /// lifetime stamped on new orders as `expires_at`, none for no deadline
    pub order_lifetime_days: Option<i64>,
    /// transaction rows returned by history queries
    pub transaction_history_limit: usize,
}

impl StoreConfig {
    pub fn order_lifetime(&self) -> Option<Duration> {
        self.order_lifetime_days.map(Duration::days)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_credit_expiry_days: 365,
            order_lifetime_days: Some(7),
            transaction_history_limit: 15,
        }
    }
}
