use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{Result, StoreError};
use crate::types::DiscountKind;

/// a discount code and its qualification rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    pub kind: DiscountKind,
    /// percent for `Percentage`, amount for `Fixed`
    pub value: Money,
    pub min_purchase: Money,
    pub max_discount: Option<Money>,
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl DiscountCode {
    /// check the code can be attached to a new order right now
    pub fn validate_for_use(&self, total_price: Money, now: DateTime<Utc>) -> Result<()> {
        if !self.active {
            return Err(StoreError::DiscountNotApplicable {
                reason: format!("code {} is inactive", self.code),
            });
        }
        if let Some(from) = self.valid_from {
            if now < from {
                return Err(StoreError::DiscountNotApplicable {
                    reason: format!("code {} is not yet valid", self.code),
                });
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return Err(StoreError::DiscountNotApplicable {
                    reason: format!("code {} has expired", self.code),
                });
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.used_count >= limit {
                return Err(StoreError::DiscountNotApplicable {
                    reason: format!("code {} usage limit reached", self.code),
                });
            }
        }
        if total_price < self.min_purchase {
            return Err(StoreError::DiscountNotApplicable {
                reason: format!(
                    "order total {} below minimum purchase {}",
                    total_price, self.min_purchase
                ),
            });
        }
        Ok(())
    }

    /// discount still applies on recalculation (already-attached codes are
    /// re-qualified on totals and liveness, not usage count)
    pub fn qualifies_for(&self, total_price: Money, now: DateTime<Utc>) -> bool {
        if !self.active || total_price < self.min_purchase {
            return false;
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        true
    }

    /// discount amount for a qualifying total
    pub fn compute_discount(&self, total_price: Money) -> Money {
        match self.kind {
            DiscountKind::Percentage => {
                let raw = total_price.percentage(self.value.as_decimal());
                match self.max_discount {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            DiscountKind::Fixed => self.value,
        }
    }
}
