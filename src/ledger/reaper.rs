use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::decimal::Money;
use crate::events::{Event, EventStore};

use super::WalletLedger;

/// result of one reaper sweep
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepReport {
    pub removed_count: usize,
    pub forfeited_total: Money,
}

/// batch deletion of expired gift credits
///
/// The reaper is the only actor allowed to delete credit rows outright, and
/// it does so regardless of remaining balance. Deletion is not a spend, so
/// no ledger transaction is written; forfeited balances surface only through
/// `CreditExpired` events and the returned report.
pub struct ExpiryReaper;

impl ExpiryReaper {
    /// remove every credit whose expiry has passed
    ///
    /// Idempotent: a second sweep at the same time removes nothing further.
    pub fn sweep(
        ledger: &mut WalletLedger,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> SweepReport {
        let now = time_provider.now();
        let mut report = SweepReport::default();

        for user_id in ledger.user_ids() {
            for credit in ledger.remove_expired_credits(user_id, now) {
                report.removed_count += 1;
                report.forfeited_total += credit.remaining_balance;
                events.emit(Event::CreditExpired {
                    user_id,
                    credit_id: credit.id,
                    forfeited_balance: credit.remaining_balance,
                    timestamp: now,
                });
            }
        }

        info!(
            removed = report.removed_count,
            forfeited = %report.forfeited_total,
            "expired credit sweep finished"
        );
        report
    }
}
