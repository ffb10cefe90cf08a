use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::discount::DiscountCode;

use super::LineItem;

/// recomputed order totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingOutcome {
    pub total_price: Money,
    pub discount_amount: Money,
    pub final_price: Money,
}

/// order repricing
///
/// A pure function over the item list and the attached discount code, run
/// after every item mutation. The attached code is re-qualified against the
/// new total: a code that no longer qualifies silently contributes zero
/// rather than failing the edit.
pub struct PricingEngine;

impl PricingEngine {
    pub fn recalculate(
        items: &[LineItem],
        discount: Option<&DiscountCode>,
        now: DateTime<Utc>,
    ) -> PricingOutcome {
        let total_price: Money = items.iter().map(|i| i.line_total()).sum();

        let discount_amount = match discount {
            Some(code) if code.qualifies_for(total_price, now) => {
                code.compute_discount(total_price)
            }
            _ => Money::ZERO,
        };

        PricingOutcome {
            total_price,
            discount_amount,
            final_price: total_price.saturating_sub(discount_amount),
        }
    }
}
