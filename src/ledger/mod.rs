pub mod planner;
pub mod reaper;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{Result, StoreError};
use crate::types::{CreditId, OrderId, TransactionId, UserId, WalletType};

pub use planner::{ConsumptionPlan, ConsumptionSource, CreditConsumptionPlanner, PlanStep};
pub use reaper::{ExpiryReaper, SweepReport};

/// a gift credit grant with a fixed expiry
///
/// `remaining_balance` only ever decreases through consumption; the row is
/// excluded from active queries once drained or past expiry, but only the
/// reaper deletes it outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporaryCredit {
    pub id: CreditId,
    pub user_id: UserId,
    pub remaining_balance: Money,
    pub original_amount: Money,
    pub expires_at: DateTime<Utc>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl TemporaryCredit {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.remaining_balance > Money::ZERO && self.expires_at > now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// immutable ledger entry; credits are positive, debits negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: Money,
    pub wallet_type: WalletType,
    pub source_credit_id: Option<CreditId>,
    pub description: String,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

/// read snapshot used for planning; taking it acquires no locks
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSnapshot {
    pub permanent_balance: Money,
    /// active credits, soonest expiry first, ties broken by ascending id
    pub temporary_credits: Vec<TemporaryCredit>,
}

impl WalletSnapshot {
    pub fn total_balance(&self) -> Money {
        self.permanent_balance
            + self
                .temporary_credits
                .iter()
                .map(|c| c.remaining_balance)
                .sum()
    }
}

/// aggregate wallet report across all users
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WalletStatistics {
    pub permanent_users: usize,
    pub permanent_total: Money,
    pub temporary_users: usize,
    pub temporary_count: usize,
    pub temporary_total: Money,
    pub expired_count: usize,
}

#[derive(Debug, Default)]
struct UserWallet {
    permanent_balance: Money,
    temporary_credits: Vec<TemporaryCredit>,
    transactions: Vec<WalletTransaction>,
}

/// dual-balance credit ledger
///
/// Owns the permanent balance and the set of expiring gift credits per user,
/// plus an append-only transaction log. The stored balances are a
/// materialized view; the signed transaction log reconstructs them.
///
/// All mutation goes through the primitives here, each of which validates
/// fully before touching state, so a returned error implies no change.
/// Callers exposing this ledger from multiple threads must serialize
/// per-user mutation; planning reads are safe against a snapshot.
#[derive(Debug)]
pub struct WalletLedger {
    wallets: HashMap<UserId, UserWallet>,
    next_credit_id: CreditId,
    next_transaction_id: TransactionId,
}

impl Default for WalletLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletLedger {
    pub fn new() -> Self {
        Self {
            wallets: HashMap::new(),
            next_credit_id: 1,
            next_transaction_id: 1,
        }
    }

    /// current permanent balance; zero for users the ledger has never seen
    pub fn permanent_balance(&self, user_id: UserId) -> Money {
        self.wallets
            .get(&user_id)
            .map(|w| w.permanent_balance)
            .unwrap_or(Money::ZERO)
    }

    /// active gift credits, soonest expiry first, ties by ascending id
    pub fn active_temporary_credits(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Vec<TemporaryCredit> {
        let mut credits: Vec<TemporaryCredit> = self
            .wallets
            .get(&user_id)
            .map(|w| {
                w.temporary_credits
                    .iter()
                    .filter(|c| c.is_active(now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        credits.sort_by_key(|c| (c.expires_at, c.id));
        credits
    }

    /// permanent plus active temporary balance
    pub fn total_balance(&self, user_id: UserId, now: DateTime<Utc>) -> Money {
        self.permanent_balance(user_id)
            + self
                .active_temporary_credits(user_id, now)
                .iter()
                .map(|c| c.remaining_balance)
                .sum()
    }

    /// consistent read snapshot for planning
    pub fn snapshot(&self, user_id: UserId, now: DateTime<Utc>) -> WalletSnapshot {
        WalletSnapshot {
            permanent_balance: self.permanent_balance(user_id),
            temporary_credits: self.active_temporary_credits(user_id, now),
        }
    }

    /// credit the permanent balance
    pub fn add_permanent_credit(
        &mut self,
        user_id: UserId,
        amount: Money,
        description: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<TransactionId> {
        if !amount.is_positive() {
            return Err(StoreError::InvalidAmount { amount });
        }

        let now = time_provider.now();
        let wallet = self.wallets.entry(user_id).or_default();
        wallet.permanent_balance += amount;

        Ok(Self::record(
            &mut self.next_transaction_id,
            wallet,
            user_id,
            amount,
            WalletType::Permanent,
            None,
            description,
            None,
            now,
        ))
    }

    /// grant a gift credit with an expiry
    pub fn add_temporary_credit(
        &mut self,
        user_id: UserId,
        amount: Money,
        expires_at: DateTime<Utc>,
        description: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<CreditId> {
        if !amount.is_positive() {
            return Err(StoreError::InvalidAmount { amount });
        }
        let now = time_provider.now();
        if expires_at <= now {
            return Err(StoreError::InvalidExpiry { expires_at });
        }

        let credit_id = self.next_credit_id;
        self.next_credit_id += 1;

        let wallet = self.wallets.entry(user_id).or_default();
        wallet.temporary_credits.push(TemporaryCredit {
            id: credit_id,
            user_id,
            remaining_balance: amount,
            original_amount: amount,
            expires_at,
            description: description.to_string(),
            created_at: now,
        });

        Self::record(
            &mut self.next_transaction_id,
            wallet,
            user_id,
            amount,
            WalletType::Temporary,
            Some(credit_id),
            description,
            None,
            now,
        );

        Ok(credit_id)
    }

    /// debit the permanent balance
    pub fn deduct_permanent(
        &mut self,
        user_id: UserId,
        amount: Money,
        description: &str,
        order_id: Option<OrderId>,
        time_provider: &SafeTimeProvider,
    ) -> Result<TransactionId> {
        if !amount.is_positive() {
            return Err(StoreError::InvalidAmount { amount });
        }

        let now = time_provider.now();
        let available = self.permanent_balance(user_id);
        if amount > available {
            return Err(StoreError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let wallet = self
            .wallets
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound { user_id })?;
        wallet.permanent_balance -= amount;

        Ok(Self::record(
            &mut self.next_transaction_id,
            wallet,
            user_id,
            Money::ZERO - amount,
            WalletType::Permanent,
            None,
            description,
            order_id,
            now,
        ))
    }

    /// debit a specific gift credit
    pub fn deduct_temporary(
        &mut self,
        user_id: UserId,
        credit_id: CreditId,
        amount: Money,
        description: &str,
        order_id: Option<OrderId>,
        time_provider: &SafeTimeProvider,
    ) -> Result<TransactionId> {
        if !amount.is_positive() {
            return Err(StoreError::InvalidAmount { amount });
        }

        let now = time_provider.now();
        let wallet = self
            .wallets
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound { user_id })?;

        let credit = wallet
            .temporary_credits
            .iter_mut()
            .find(|c| c.id == credit_id)
            .ok_or(StoreError::CreditNotFound { credit_id })?;

        if credit.is_expired(now) {
            return Err(StoreError::CreditNotFound { credit_id });
        }
        if amount > credit.remaining_balance {
            return Err(StoreError::InsufficientBalance {
                available: credit.remaining_balance,
                requested: amount,
            });
        }

        credit.remaining_balance -= amount;

        Ok(Self::record(
            &mut self.next_transaction_id,
            wallet,
            user_id,
            Money::ZERO - amount,
            WalletType::Temporary,
            Some(credit_id),
            description,
            order_id,
            now,
        ))
    }

    /// apply a consumption plan as one all-or-nothing commit
    ///
    /// Every step is re-validated against current state before anything is
    /// debited, because the snapshot the plan came from may be stale. Any
    /// shortfall fails the whole commit with `ConcurrencyConflict` and the
    /// caller must re-plan.
    pub fn commit_plan(
        &mut self,
        user_id: UserId,
        plan: &ConsumptionPlan,
        description: &str,
        order_id: Option<OrderId>,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<TransactionId>> {
        let now = time_provider.now();

        if plan.steps.is_empty() {
            return Ok(Vec::new());
        }

        // validation pass: nothing is mutated until every step clears
        let wallet = self
            .wallets
            .get(&user_id)
            .ok_or(StoreError::UserNotFound { user_id })?;

        // amounts are summed per source first, so a plan naming the same
        // credit twice is checked against its combined draw
        let mut permanent_needed = Money::ZERO;
        let mut temporary_needed: HashMap<CreditId, Money> = HashMap::new();
        for step in &plan.steps {
            match step.source {
                ConsumptionSource::Permanent => permanent_needed += step.amount,
                ConsumptionSource::Temporary { credit_id } => {
                    *temporary_needed.entry(credit_id).or_insert(Money::ZERO) += step.amount;
                }
            }
        }
        for (credit_id, needed) in &temporary_needed {
            let credit = wallet
                .temporary_credits
                .iter()
                .find(|c| c.id == *credit_id)
                .filter(|c| c.is_active(now));
            match credit {
                Some(c) if c.remaining_balance >= *needed => {}
                _ => {
                    return Err(StoreError::ConcurrencyConflict {
                        message: format!("credit {} no longer covers {}", credit_id, needed),
                    })
                }
            }
        }
        if permanent_needed > wallet.permanent_balance {
            return Err(StoreError::ConcurrencyConflict {
                message: format!(
                    "permanent balance {} no longer covers {}",
                    wallet.permanent_balance, permanent_needed
                ),
            });
        }

        // apply pass: validated above, so the primitives cannot fail here
        let mut transaction_ids = Vec::with_capacity(plan.steps.len());
        for step in &plan.steps {
            let tx_id = match step.source {
                ConsumptionSource::Permanent => self.deduct_permanent(
                    user_id,
                    step.amount,
                    description,
                    order_id,
                    time_provider,
                )?,
                ConsumptionSource::Temporary { credit_id } => self.deduct_temporary(
                    user_id,
                    credit_id,
                    step.amount,
                    description,
                    order_id,
                    time_provider,
                )?,
            };
            transaction_ids.push(tx_id);
        }

        Ok(transaction_ids)
    }

    /// most recent transactions first, capped at `limit`
    pub fn transactions(&self, user_id: UserId, limit: usize) -> Vec<WalletTransaction> {
        self.wallets
            .get(&user_id)
            .map(|w| w.transactions.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// full transaction log for a user, oldest first
    pub fn transaction_log(&self, user_id: UserId) -> &[WalletTransaction] {
        self.wallets
            .get(&user_id)
            .map(|w| w.transactions.as_slice())
            .unwrap_or(&[])
    }

    /// aggregate report across all wallets
    pub fn statistics(&self, now: DateTime<Utc>) -> WalletStatistics {
        let mut stats = WalletStatistics::default();
        for wallet in self.wallets.values() {
            if wallet.permanent_balance > Money::ZERO {
                stats.permanent_users += 1;
                stats.permanent_total += wallet.permanent_balance;
            }
            let active: Vec<_> = wallet
                .temporary_credits
                .iter()
                .filter(|c| c.is_active(now))
                .collect();
            if !active.is_empty() {
                stats.temporary_users += 1;
                stats.temporary_count += active.len();
                stats.temporary_total += active.iter().map(|c| c.remaining_balance).sum();
            }
            stats.expired_count += wallet
                .temporary_credits
                .iter()
                .filter(|c| c.is_expired(now))
                .count();
        }
        stats
    }

    pub(crate) fn user_ids(&self) -> Vec<UserId> {
        self.wallets.keys().copied().collect()
    }

    /// remove expired credits for one user, returning the removed rows
    pub(crate) fn remove_expired_credits(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Vec<TemporaryCredit> {
        let Some(wallet) = self.wallets.get_mut(&user_id) else {
            return Vec::new();
        };
        let (expired, kept): (Vec<_>, Vec<_>) = wallet
            .temporary_credits
            .drain(..)
            .partition(|c| c.is_expired(now));
        wallet.temporary_credits = kept;
        expired
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        next_transaction_id: &mut TransactionId,
        wallet: &mut UserWallet,
        user_id: UserId,
        amount: Money,
        wallet_type: WalletType,
        source_credit_id: Option<CreditId>,
        description: &str,
        order_id: Option<OrderId>,
        now: DateTime<Utc>,
    ) -> TransactionId {
        let id = *next_transaction_id;
        *next_transaction_id += 1;
        wallet.transactions.push(WalletTransaction {
            id,
            user_id,
            amount,
            wallet_type,
            source_credit_id,
            description: description.to_string(),
            order_id,
            created_at: now,
        });
        id
    }
}
