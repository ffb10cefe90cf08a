use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{Result, StoreError};
use crate::events::{Event, EventStore};
use crate::ledger::WalletLedger;
use crate::orders::Order;
use crate::types::{OrderStatus, UserId};

/// ephemeral filter describing one campaign run; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignFilter {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub min_amount: Money,
    pub max_amount: Option<Money>,
    pub credit_percent: Rate,
    /// zero grants permanent credit instead of an expiring one
    pub expiry_days: u32,
}

impl CampaignFilter {
    /// revalidate admin input; the conversation layer is not trusted
    pub fn validate(&self, config: &StoreConfig) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(StoreError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.min_amount.is_negative() {
            return Err(StoreError::InvalidAmount {
                amount: self.min_amount,
            });
        }
        if let Some(max) = self.max_amount {
            if max < self.min_amount {
                return Err(StoreError::InvalidAmount { amount: max });
            }
        }
        let percent = self.credit_percent.as_percentage();
        if percent <= rust_decimal::Decimal::ZERO || percent > rust_decimal::Decimal::from(100) {
            return Err(StoreError::InvalidPercent {
                percent: self.credit_percent,
            });
        }
        if self.expiry_days > config.max_credit_expiry_days {
            return Err(StoreError::InvalidExpiryDays {
                days: self.expiry_days,
                max: config.max_credit_expiry_days,
            });
        }
        Ok(())
    }
}

/// one user the filter matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibleUser {
    pub user_id: UserId,
    pub aggregated_spend: Money,
    pub proposed_credit: Money,
}

/// outcome of an executed campaign; per-user failures never abort the batch
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignReport {
    pub run_id: Uuid,
    pub granted: Vec<EligibleUser>,
    pub failures: Vec<(UserId, String)>,
    pub total_credit: Money,
}

/// scans confirmed orders and derives per-user credit grants
pub struct CampaignEligibilityEngine;

impl CampaignEligibilityEngine {
    /// aggregate confirmed spend per user within the filter window
    ///
    /// Returns users sorted by id so previews and grant order are stable.
    pub fn find_eligible<'a>(
        orders: impl IntoIterator<Item = &'a Order>,
        filter: &CampaignFilter,
    ) -> Vec<EligibleUser> {
        let mut spend_by_user: std::collections::BTreeMap<UserId, Money> =
            std::collections::BTreeMap::new();

        for order in orders {
            if order.status != OrderStatus::Confirmed {
                continue;
            }
            if order.created_at < filter.start_date || order.created_at > filter.end_date {
                continue;
            }
            if order.final_price < filter.min_amount {
                continue;
            }
            if let Some(max) = filter.max_amount {
                if order.final_price > max {
                    continue;
                }
            }
            *spend_by_user.entry(order.user_id).or_insert(Money::ZERO) += order.final_price;
        }

        spend_by_user
            .into_iter()
            .map(|(user_id, aggregated_spend)| EligibleUser {
                user_id,
                aggregated_spend,
                proposed_credit: filter.credit_percent.of(aggregated_spend),
            })
            .collect()
    }

    /// execute the campaign: grant each eligible user their credit
    ///
    /// Best-effort batch: a failed grant is logged and recorded in the
    /// report while the rest of the batch proceeds.
    pub fn apply<'a>(
        ledger: &mut WalletLedger,
        orders: impl IntoIterator<Item = &'a Order>,
        filter: &CampaignFilter,
        config: &StoreConfig,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<CampaignReport> {
        filter.validate(config)?;

        let run_id = Uuid::new_v4();
        let now = time_provider.now();
        let eligible = Self::find_eligible(orders, filter);

        let mut report = CampaignReport {
            run_id,
            granted: Vec::new(),
            failures: Vec::new(),
            total_credit: Money::ZERO,
        };

        let description = format!("campaign {} of qualifying spend", filter.credit_percent);
        for user in eligible {
            let expires_at = if filter.expiry_days > 0 {
                Some(now + Duration::days(filter.expiry_days as i64))
            } else {
                None
            };

            let grant = match expires_at {
                Some(deadline) => ledger
                    .add_temporary_credit(
                        user.user_id,
                        user.proposed_credit,
                        deadline,
                        &description,
                        time_provider,
                    )
                    .map(|_| ()),
                None => ledger
                    .add_permanent_credit(
                        user.user_id,
                        user.proposed_credit,
                        &description,
                        time_provider,
                    )
                    .map(|_| ()),
            };

            match grant {
                Ok(()) => {
                    events.emit(Event::CampaignCreditGranted {
                        user_id: user.user_id,
                        amount: user.proposed_credit,
                        expires_at,
                        aggregated_spend: user.aggregated_spend,
                        timestamp: now,
                    });
                    report.total_credit += user.proposed_credit;
                    report.granted.push(user);
                }
                Err(err) => {
                    warn!(
                        %run_id,
                        user_id = user.user_id,
                        amount = %user.proposed_credit,
                        error = %err,
                        "campaign grant failed, continuing batch"
                    );
                    report.failures.push((user.user_id, err.to_string()));
                }
            }
        }

        info!(
            %run_id,
            granted = report.granted.len(),
            failed = report.failures.len(),
            total = %report.total_credit,
            "campaign run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::LineItem;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn confirmed_order(
        id: u64,
        user_id: UserId,
        final_price: i64,
        created_at: DateTime<Utc>,
    ) -> Order {
        let final_price = Money::from_major(final_price);
        Order {
            id,
            user_id,
            items: vec![LineItem {
                product_id: 1,
                pack_id: 1,
                product_name: "tea".to_string(),
                pack_name: "box".to_string(),
                unit_price: final_price,
                quantity: 1,
                notes: None,
            }],
            total_price: final_price,
            discount_code: None,
            discount_amount: Money::ZERO,
            final_price,
            wallet_payment_amount: Money::ZERO,
            remaining_due: Money::ZERO,
            status: OrderStatus::Confirmed,
            created_at,
            expires_at: None,
        }
    }

    fn filter(time: &SafeTimeProvider) -> CampaignFilter {
        CampaignFilter {
            start_date: time.now() - Duration::days(30),
            end_date: time.now(),
            min_amount: Money::from_major(500_000),
            max_amount: None,
            credit_percent: Rate::from_percentage(10),
            expiry_days: 30,
        }
    }

    #[test]
    fn test_eligibility_aggregates_per_user() {
        let time = test_time();
        let in_window = time.now() - Duration::days(5);
        let orders = vec![
            confirmed_order(1, 100, 600_000, in_window),
            confirmed_order(2, 100, 700_000, in_window),
            confirmed_order(3, 200, 500_000, in_window),
            // below minimum
            confirmed_order(4, 300, 100_000, in_window),
            // outside the window
            confirmed_order(5, 400, 900_000, time.now() - Duration::days(60)),
        ];

        let eligible = CampaignEligibilityEngine::find_eligible(&orders, &filter(&time));

        assert_eq!(eligible.len(), 2);
        assert_eq!(eligible[0].user_id, 100);
        assert_eq!(eligible[0].aggregated_spend, Money::from_major(1_300_000));
        assert_eq!(eligible[0].proposed_credit, Money::from_major(130_000));
        assert_eq!(eligible[1].user_id, 200);
        assert_eq!(eligible[1].proposed_credit, Money::from_major(50_000));
    }

    #[test]
    fn test_only_confirmed_orders_count() {
        let time = test_time();
        let in_window = time.now() - Duration::days(5);
        let mut pending = confirmed_order(1, 100, 600_000, in_window);
        pending.status = OrderStatus::Pending;
        let mut paid = confirmed_order(2, 100, 600_000, in_window);
        paid.status = OrderStatus::PaymentConfirmed;

        let eligible =
            CampaignEligibilityEngine::find_eligible([&pending, &paid], &filter(&time));
        assert!(eligible.is_empty());
    }

    #[test]
    fn test_max_amount_bound() {
        let time = test_time();
        let in_window = time.now() - Duration::days(5);
        let orders = vec![
            confirmed_order(1, 100, 600_000, in_window),
            confirmed_order(2, 200, 3_000_000, in_window),
        ];
        let mut f = filter(&time);
        f.max_amount = Some(Money::from_major(1_000_000));

        let eligible = CampaignEligibilityEngine::find_eligible(&orders, &f);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].user_id, 100);
    }

    #[test]
    fn test_filter_validation() {
        let time = test_time();
        let config = StoreConfig::default();

        let mut bad = filter(&time);
        bad.end_date = bad.start_date - Duration::days(1);
        assert!(bad.validate(&config).is_err());

        let mut bad = filter(&time);
        bad.credit_percent = Rate::from_percentage(0);
        assert!(bad.validate(&config).is_err());

        let mut bad = filter(&time);
        bad.credit_percent = Rate::from_percentage(101);
        assert!(bad.validate(&config).is_err());

        let mut bad = filter(&time);
        bad.expiry_days = 400;
        assert!(matches!(
            bad.validate(&config),
            Err(StoreError::InvalidExpiryDays { .. })
        ));

        assert!(filter(&time).validate(&config).is_ok());
    }

    #[test]
    fn test_apply_grants_temporary_credit() {
        let time = test_time();
        let mut ledger = WalletLedger::new();
        let mut events = EventStore::new();
        let config = StoreConfig::default();
        let in_window = time.now() - Duration::days(5);
        let orders = vec![confirmed_order(1, 100, 600_000, in_window)];

        let report = CampaignEligibilityEngine::apply(
            &mut ledger,
            &orders,
            &filter(&time),
            &config,
            &time,
            &mut events,
        )
        .unwrap();

        assert_eq!(report.granted.len(), 1);
        assert!(report.failures.is_empty());
        assert_eq!(report.total_credit, Money::from_major(60_000));

        let credits = ledger.active_temporary_credits(100, time.now());
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].remaining_balance, Money::from_major(60_000));
        assert_eq!(credits[0].expires_at, time.now() + Duration::days(30));

        assert!(matches!(
            events.take_events()[0],
            Event::CampaignCreditGranted { user_id: 100, .. }
        ));
    }

    #[test]
    fn test_apply_with_zero_expiry_grants_permanent() {
        let time = test_time();
        let mut ledger = WalletLedger::new();
        let mut events = EventStore::new();
        let config = StoreConfig::default();
        let in_window = time.now() - Duration::days(5);
        let orders = vec![confirmed_order(1, 100, 600_000, in_window)];

        let mut f = filter(&time);
        f.expiry_days = 0;

        CampaignEligibilityEngine::apply(
            &mut ledger,
            &orders,
            &f,
            &config,
            &time,
            &mut events,
        )
        .unwrap();

        assert_eq!(ledger.permanent_balance(100), Money::from_major(60_000));
        assert!(ledger.active_temporary_credits(100, time.now()).is_empty());
    }
}
