use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{Result, StoreError};
use crate::types::CreditId;

use super::WalletSnapshot;

/// where a plan step draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumptionSource {
    /// a specific gift credit
    Temporary { credit_id: CreditId },
    /// the permanent balance
    Permanent,
}

/// one debit of a consumption plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub source: ConsumptionSource,
    pub amount: Money,
}

/// ordered list of debits fulfilling a payment request from available credit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPlan {
    pub steps: Vec<PlanStep>,
    /// how much of the amount due the wallet can cover
    pub usable_amount: Money,
    /// what the customer still owes after the plan is committed
    pub remainder_due: Money,
}

impl ConsumptionPlan {
    pub fn covers_fully(&self) -> bool {
        self.remainder_due.is_zero()
    }
}

/// computes consumption plans without mutating any state
///
/// Gift credits are drained soonest-expiry-first before the permanent
/// balance is touched; a plan is a pure function of the snapshot it was
/// computed from and committing it is the ledger's job.
pub struct CreditConsumptionPlanner;

impl CreditConsumptionPlanner {
    pub fn plan(snapshot: &WalletSnapshot, amount_due: Money) -> Result<ConsumptionPlan> {
        if !amount_due.is_positive() {
            return Err(StoreError::InvalidAmount { amount: amount_due });
        }

        let usable_amount = amount_due.min(snapshot.total_balance());
        let mut still_needed = usable_amount;
        let mut steps = Vec::new();

        // snapshot credits are already ordered by (expires_at, id)
        for credit in &snapshot.temporary_credits {
            if still_needed.is_zero() {
                break;
            }
            let take = credit.remaining_balance.min(still_needed);
            if take.is_positive() {
                steps.push(PlanStep {
                    source: ConsumptionSource::Temporary {
                        credit_id: credit.id,
                    },
                    amount: take,
                });
                still_needed -= take;
            }
        }

        if still_needed.is_positive() {
            let take = still_needed.min(snapshot.permanent_balance);
            if take.is_positive() {
                steps.push(PlanStep {
                    source: ConsumptionSource::Permanent,
                    amount: take,
                });
                still_needed -= take;
            }
        }

        debug_assert!(still_needed.is_zero());

        Ok(ConsumptionPlan {
            steps,
            usable_amount,
            remainder_due: amount_due - usable_amount,
        })
    }
}
