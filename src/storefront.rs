use std::collections::{BTreeMap, HashMap};

use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::campaign::{CampaignEligibilityEngine, CampaignFilter, CampaignReport, EligibleUser};
use crate::config::StoreConfig;
use crate::decimal::Money;
use crate::discount::DiscountCode;
use crate::errors::{Result, StoreError};
use crate::events::{Event, EventStore};
use crate::ledger::{
    ConsumptionPlan, CreditConsumptionPlanner, ExpiryReaper, SweepReport, TemporaryCredit,
    WalletLedger, WalletStatistics, WalletTransaction,
};
use crate::orders::{LineItem, Order, PricingEngine};
use crate::types::{CreditId, OrderId, OrderStatus, TransactionId, UserId};

/// what applying wallet credit to an order accomplished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletPaymentOutcome {
    pub applied_amount: Money,
    pub remaining_due: Money,
    pub fully_paid: bool,
    pub transaction_ids: Vec<TransactionId>,
}

/// the store core: wallet ledger, orders, and discount codes behind one
/// explicitly constructed instance
///
/// Every operation either completes or returns an error having changed
/// nothing. Wallet-payment application commits the credit plan and the order
/// update as one logical transaction; notification events become visible
/// only afterwards, via `take_events`.
#[derive(Debug)]
pub struct Storefront {
    config: StoreConfig,
    ledger: WalletLedger,
    orders: BTreeMap<OrderId, Order>,
    discounts: HashMap<String, DiscountCode>,
    events: EventStore,
    next_order_id: OrderId,
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Storefront {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            ledger: WalletLedger::new(),
            orders: BTreeMap::new(),
            discounts: HashMap::new(),
            events: EventStore::new(),
            next_order_id: 1,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ---- wallet ----

    /// admin top-up of the permanent balance
    pub fn charge_permanent_credit(
        &mut self,
        user_id: UserId,
        amount: Money,
        description: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<TransactionId> {
        let tx_id = self
            .ledger
            .add_permanent_credit(user_id, amount, description, time_provider)?;
        self.events.emit(Event::PermanentCreditAdded {
            user_id,
            amount,
            new_balance: self.ledger.permanent_balance(user_id),
            timestamp: time_provider.now(),
        });
        Ok(tx_id)
    }

    /// admin gift grant, expiring after `days`
    pub fn grant_gift_credit(
        &mut self,
        user_id: UserId,
        amount: Money,
        days: u32,
        description: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<CreditId> {
        if days == 0 || days > self.config.max_credit_expiry_days {
            return Err(StoreError::InvalidExpiryDays {
                days,
                max: self.config.max_credit_expiry_days,
            });
        }
        let expires_at = time_provider.now() + chrono::Duration::days(days as i64);
        let credit_id = self.ledger.add_temporary_credit(
            user_id,
            amount,
            expires_at,
            description,
            time_provider,
        )?;
        self.events.emit(Event::TemporaryCreditGranted {
            user_id,
            credit_id,
            amount,
            expires_at,
            description: description.to_string(),
            timestamp: time_provider.now(),
        });
        Ok(credit_id)
    }

    pub fn permanent_balance(&self, user_id: UserId) -> Money {
        self.ledger.permanent_balance(user_id)
    }

    pub fn active_gift_credits(
        &self,
        user_id: UserId,
        time_provider: &SafeTimeProvider,
    ) -> Vec<TemporaryCredit> {
        self.ledger
            .active_temporary_credits(user_id, time_provider.now())
    }

    pub fn total_balance(&self, user_id: UserId, time_provider: &SafeTimeProvider) -> Money {
        self.ledger.total_balance(user_id, time_provider.now())
    }

    pub fn recent_transactions(&self, user_id: UserId) -> Vec<WalletTransaction> {
        self.ledger
            .transactions(user_id, self.config.transaction_history_limit)
    }

    pub fn wallet_statistics(&self, time_provider: &SafeTimeProvider) -> WalletStatistics {
        self.ledger.statistics(time_provider.now())
    }

    // ---- discounts ----

    pub fn register_discount(&mut self, code: DiscountCode) {
        self.discounts.insert(code.code.clone(), code);
    }

    pub fn discount(&self, code: &str) -> Option<&DiscountCode> {
        self.discounts.get(code)
    }

    // ---- orders ----

    /// create an order from checkout or admin invoicing
    pub fn create_order(
        &mut self,
        user_id: UserId,
        items: Vec<LineItem>,
        time_provider: &SafeTimeProvider,
    ) -> Result<OrderId> {
        if items.is_empty() {
            return Err(StoreError::EmptyOrder);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(StoreError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            if item.unit_price.is_negative() {
                return Err(StoreError::InvalidAmount {
                    amount: item.unit_price,
                });
            }
        }

        let now = time_provider.now();
        let outcome = PricingEngine::recalculate(&items, None, now);
        let order_id = self.next_order_id;
        self.next_order_id += 1;

        let order = Order {
            id: order_id,
            user_id,
            items,
            total_price: outcome.total_price,
            discount_code: None,
            discount_amount: outcome.discount_amount,
            final_price: outcome.final_price,
            wallet_payment_amount: Money::ZERO,
            remaining_due: outcome.final_price,
            status: OrderStatus::Pending,
            created_at: now,
            expires_at: self.config.order_lifetime().map(|ttl| now + ttl),
        };
        self.events.emit(Event::OrderCreated {
            order_id,
            user_id,
            final_price: order.final_price,
            timestamp: now,
        });
        self.orders.insert(order_id, order);
        Ok(order_id)
    }

    pub fn order(&self, order_id: OrderId) -> Result<&Order> {
        self.orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })
    }

    pub fn user_orders(&self, user_id: UserId) -> Vec<&Order> {
        self.orders
            .values()
            .filter(|o| o.user_id == user_id)
            .collect()
    }

    /// attach a discount code to a payable order and reprice
    pub fn attach_discount(
        &mut self,
        order_id: OrderId,
        code: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        let order = self
            .orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        if !order.status.allows_item_edits() {
            return Err(StoreError::OrderNotEditable {
                status: order.status,
            });
        }
        let total_price = order.total_price;

        let discount = self
            .discounts
            .get_mut(code)
            .ok_or_else(|| StoreError::DiscountNotFound {
                code: code.to_string(),
            })?;
        discount.validate_for_use(total_price, now)?;
        discount.used_count += 1;

        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        order.discount_code = Some(code.to_string());
        Self::reprice(order, &self.discounts, &mut self.events, now);
        Ok(())
    }

    /// set one line's quantity and reprice in the same update
    pub fn set_item_quantity(
        &mut self,
        order_id: OrderId,
        index: usize,
        quantity: u32,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        order.set_item_quantity(index, quantity, now)?;
        Self::reprice(order, &self.discounts, &mut self.events, now);
        Ok(())
    }

    /// bump one line's quantity by a signed delta and reprice
    pub fn adjust_item_quantity(
        &mut self,
        order_id: OrderId,
        index: usize,
        delta: i32,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        order.adjust_item_quantity(index, delta, now)?;
        Self::reprice(order, &self.discounts, &mut self.events, now);
        Ok(())
    }

    /// remove one line and reprice in the same update
    pub fn remove_item(
        &mut self,
        order_id: OrderId,
        index: usize,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        order.remove_item(index, now)?;
        Self::reprice(order, &self.discounts, &mut self.events, now);
        Ok(())
    }

    /// apply available wallet credit to what the order still owes
    ///
    /// Plans from a snapshot, commits the plan, and updates the order in one
    /// logical transaction; a fully covered order flips straight to
    /// `PaymentConfirmed`. A failed commit leaves both wallet and order
    /// untouched.
    pub fn apply_wallet_payment(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
    ) -> Result<WalletPaymentOutcome> {
        let now = time_provider.now();
        let order = self
            .orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        if !order.status.allows_wallet_payment() {
            return Err(StoreError::OrderNotEditable {
                status: order.status,
            });
        }
        if order.is_expired(now) {
            return Err(StoreError::OrderExpired { order_id });
        }
        let user_id = order.user_id;
        let amount_due = order.remaining_due;
        if !amount_due.is_positive() {
            return Ok(WalletPaymentOutcome {
                applied_amount: Money::ZERO,
                remaining_due: Money::ZERO,
                fully_paid: true,
                transaction_ids: Vec::new(),
            });
        }

        let plan = self.plan_wallet_payment(user_id, amount_due, time_provider)?;
        if !plan.usable_amount.is_positive() {
            return Err(StoreError::InsufficientBalance {
                available: Money::ZERO,
                requested: amount_due,
            });
        }

        let description = format!("payment for order #{}", order_id);
        let transaction_ids = self.ledger.commit_plan(
            user_id,
            &plan,
            &description,
            Some(order_id),
            time_provider,
        )?;

        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        order.record_wallet_payment(plan.usable_amount);
        let fully_paid = order.remaining_due.is_zero();
        let old_status = order.status;
        if fully_paid {
            order.status = OrderStatus::PaymentConfirmed;
        }
        let remaining_due = order.remaining_due;

        self.events.emit(Event::WalletPaymentApplied {
            user_id,
            order_id,
            applied_amount: plan.usable_amount,
            remaining_due,
            timestamp: now,
        });
        if fully_paid {
            self.events.emit(Event::OrderStatusChanged {
                order_id,
                user_id,
                old_status,
                new_status: OrderStatus::PaymentConfirmed,
                timestamp: now,
            });
        }

        Ok(WalletPaymentOutcome {
            applied_amount: plan.usable_amount,
            remaining_due,
            fully_paid,
            transaction_ids,
        })
    }

    /// read-only preview of how a payment would draw down credit
    pub fn plan_wallet_payment(
        &self,
        user_id: UserId,
        amount_due: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<ConsumptionPlan> {
        let snapshot = self.ledger.snapshot(user_id, time_provider.now());
        CreditConsumptionPlanner::plan(&snapshot, amount_due)
    }

    pub fn approve_order(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.transition(order_id, time_provider, Order::approve)
    }

    pub fn attach_receipt(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.transition(order_id, time_provider, Order::attach_receipt)
    }

    pub fn accept_receipt(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.transition(order_id, time_provider, Order::accept_receipt)
    }

    pub fn reject_receipt(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.transition(order_id, time_provider, Order::reject_receipt)
    }

    pub fn confirm_order(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.transition(order_id, time_provider, Order::confirm)
    }

    pub fn reject_order(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.transition(order_id, time_provider, Order::reject)
    }

    /// delete a non-terminal order
    pub fn delete_order(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let order = self
            .orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        if !order.can_delete() {
            return Err(StoreError::OrderNotEditable {
                status: order.status,
            });
        }
        let user_id = order.user_id;
        self.orders.remove(&order_id);
        self.events.emit(Event::OrderDeleted {
            order_id,
            user_id,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    // ---- batch jobs ----

    /// preview which users a campaign filter would reach
    pub fn preview_campaign(&self, filter: &CampaignFilter) -> Result<Vec<EligibleUser>> {
        filter.validate(&self.config)?;
        Ok(CampaignEligibilityEngine::find_eligible(
            self.orders.values(),
            filter,
        ))
    }

    /// execute a campaign over confirmed order history
    pub fn run_campaign(
        &mut self,
        filter: &CampaignFilter,
        time_provider: &SafeTimeProvider,
    ) -> Result<CampaignReport> {
        CampaignEligibilityEngine::apply(
            &mut self.ledger,
            self.orders.values(),
            filter,
            &self.config,
            time_provider,
            &mut self.events,
        )
    }

    /// delete every gift credit whose expiry has passed
    pub fn sweep_expired_credits(&mut self, time_provider: &SafeTimeProvider) -> SweepReport {
        ExpiryReaper::sweep(&mut self.ledger, time_provider, &mut self.events)
    }

    /// drain the post-commit notification outbox
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    // ---- internals ----

    fn transition(
        &mut self,
        order_id: OrderId,
        time_provider: &SafeTimeProvider,
        op: fn(&mut Order) -> Result<()>,
    ) -> Result<()> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;
        let old_status = order.status;
        op(order)?;
        let new_status = order.status;
        self.events.emit(Event::OrderStatusChanged {
            order_id,
            user_id: order.user_id,
            old_status,
            new_status,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    /// persist items and totals as one update, keeping `remaining_due`
    /// consistent with the new final price
    fn reprice(
        order: &mut Order,
        discounts: &HashMap<String, DiscountCode>,
        events: &mut EventStore,
        now: chrono::DateTime<chrono::Utc>,
    ) {
        let discount = order
            .discount_code
            .as_deref()
            .and_then(|code| discounts.get(code));
        let outcome = PricingEngine::recalculate(&order.items, discount, now);
        order.total_price = outcome.total_price;
        order.discount_amount = outcome.discount_amount;
        order.final_price = outcome.final_price;
        order.remaining_due = order
            .final_price
            .saturating_sub(order.wallet_payment_amount);
        events.emit(Event::OrderRepriced {
            order_id: order.id,
            total_price: outcome.total_price,
            discount_amount: outcome.discount_amount,
            final_price: outcome.final_price,
            timestamp: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscountKind;
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn item(name: &str, unit: i64, qty: u32) -> LineItem {
        LineItem {
            product_id: 1,
            pack_id: 1,
            product_name: name.to_string(),
            pack_name: "box".to_string(),
            unit_price: Money::from_major(unit),
            quantity: qty,
            notes: None,
        }
    }

    fn ten_percent_code() -> DiscountCode {
        DiscountCode {
            code: "TEN".to_string(),
            kind: DiscountKind::Percentage,
            value: Money::from_major(10),
            min_purchase: Money::from_major(100_000),
            max_discount: Some(Money::from_major(50_000)),
            usage_limit: Some(10),
            used_count: 0,
            active: true,
            valid_from: None,
            valid_until: None,
        }
    }

    #[test]
    fn test_create_order_validation() {
        let time = test_time();
        let mut store = Storefront::new(StoreConfig::default());

        assert!(matches!(
            store.create_order(1, vec![], &time),
            Err(StoreError::EmptyOrder)
        ));
        assert!(store
            .create_order(1, vec![item("tea", 10_000, 0)], &time)
            .is_err());

        let order_id = store
            .create_order(1, vec![item("tea", 10_000, 3)], &time)
            .unwrap();
        let order = store.order(order_id).unwrap();
        assert_eq!(order.total_price, Money::from_major(30_000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.expires_at, Some(time.now() + Duration::days(7)));
    }

    #[test]
    fn test_end_to_end_wallet_payment() {
        // user holds a 50k gift credit expiring in 2 days plus 200k
        // permanent; a 120k order must drain the gift first, top up from
        // permanent, and land fully paid in the same commit
        let time = test_time();
        let mut store = Storefront::new(StoreConfig::default());

        store
            .grant_gift_credit(7, Money::from_major(50_000), 2, "welcome gift", &time)
            .unwrap();
        store
            .charge_permanent_credit(7, Money::from_major(200_000), "top-up", &time)
            .unwrap();

        let order_id = store
            .create_order(7, vec![item("tea", 60_000, 2)], &time)
            .unwrap();
        store.approve_order(order_id, &time).unwrap();
        store.take_events();

        let outcome = store.apply_wallet_payment(order_id, &time).unwrap();
        assert_eq!(outcome.applied_amount, Money::from_major(120_000));
        assert_eq!(outcome.remaining_due, Money::ZERO);
        assert!(outcome.fully_paid);
        assert_eq!(outcome.transaction_ids.len(), 2);

        let order = store.order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::PaymentConfirmed);
        assert_eq!(order.wallet_payment_amount, Money::from_major(120_000));
        assert_eq!(order.remaining_due, Money::ZERO);

        // gift fully consumed before permanent was touched
        assert!(store.active_gift_credits(7, &time).is_empty());
        assert_eq!(store.permanent_balance(7), Money::from_major(130_000));

        // payment and status change surface as post-commit events
        let events = store.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::WalletPaymentApplied { applied_amount, .. }
                if *applied_amount == Money::from_major(120_000))));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::OrderStatusChanged {
                new_status: OrderStatus::PaymentConfirmed,
                ..
            }
        )));
    }

    #[test]
    fn test_partial_wallet_payment_keeps_order_open() {
        let time = test_time();
        let mut store = Storefront::new(StoreConfig::default());

        store
            .charge_permanent_credit(7, Money::from_major(40_000), "top-up", &time)
            .unwrap();
        let order_id = store
            .create_order(7, vec![item("tea", 60_000, 2)], &time)
            .unwrap();
        store.approve_order(order_id, &time).unwrap();

        let outcome = store.apply_wallet_payment(order_id, &time).unwrap();
        assert_eq!(outcome.applied_amount, Money::from_major(40_000));
        assert_eq!(outcome.remaining_due, Money::from_major(80_000));
        assert!(!outcome.fully_paid);

        let order = store.order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::WaitingPayment);
        assert_eq!(order.remaining_due, Money::from_major(80_000));
        assert_eq!(store.permanent_balance(7), Money::ZERO);

        // with an empty wallet a second application is rejected outright
        assert!(matches!(
            store.apply_wallet_payment(order_id, &time),
            Err(StoreError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_wallet_payment_rejected_on_settled_or_expired_orders() {
        let time = test_time();
        let controller = time.test_control().unwrap();
        let mut store = Storefront::new(StoreConfig::default());

        store
            .charge_permanent_credit(7, Money::from_major(500_000), "top-up", &time)
            .unwrap();

        let confirmed = store
            .create_order(7, vec![item("tea", 10_000, 1)], &time)
            .unwrap();
        store.confirm_order(confirmed, &time).unwrap();
        assert!(matches!(
            store.apply_wallet_payment(confirmed, &time),
            Err(StoreError::OrderNotEditable { .. })
        ));

        let stale = store
            .create_order(7, vec![item("tea", 10_000, 1)], &time)
            .unwrap();
        controller.advance(Duration::days(8));
        assert!(matches!(
            store.apply_wallet_payment(stale, &time),
            Err(StoreError::OrderExpired { .. })
        ));
        // the rejected attempts spent nothing
        assert_eq!(store.permanent_balance(7), Money::from_major(500_000));
    }

    #[test]
    fn test_discount_attach_and_requalification_on_edit() {
        let time = test_time();
        let mut store = Storefront::new(StoreConfig::default());
        store.register_discount(ten_percent_code());

        let order_id = store
            .create_order(1, vec![item("tea", 100_000, 3), item("coffee", 80_000, 1)], &time)
            .unwrap();
        // total 380k -> 10% = 38k
        store.attach_discount(order_id, "TEN", &time).unwrap();
        let order = store.order(order_id).unwrap();
        assert_eq!(order.discount_amount, Money::from_major(38_000));
        assert_eq!(order.final_price, Money::from_major(342_000));
        assert_eq!(store.discount("TEN").unwrap().used_count, 1);

        // drop everything but the 80k line: code no longer qualifies
        store.remove_item(order_id, 0, &time).unwrap();
        let order = store.order(order_id).unwrap();
        assert_eq!(order.total_price, Money::from_major(80_000));
        assert_eq!(order.discount_amount, Money::ZERO);
        assert_eq!(order.final_price, Money::from_major(80_000));
        assert_eq!(order.remaining_due, Money::from_major(80_000));
    }

    #[test]
    fn test_item_edit_reprices_atomically() {
        let time = test_time();
        let mut store = Storefront::new(StoreConfig::default());

        let order_id = store
            .create_order(1, vec![item("tea", 50_000, 4), item("coffee", 25_000, 2)], &time)
            .unwrap();
        let before = store.order(order_id).unwrap().total_price;

        store.set_item_quantity(order_id, 0, 1, &time).unwrap();
        let order = store.order(order_id).unwrap();
        assert_eq!(order.total_price, Money::from_major(100_000));
        assert!(order.total_price <= before);
        assert_eq!(order.remaining_due, order.final_price);

        // last-item protection propagates through the storefront
        store.remove_item(order_id, 0, &time).unwrap();
        assert!(matches!(
            store.remove_item(order_id, 0, &time),
            Err(StoreError::LastItemRemoval { .. })
        ));
    }

    #[test]
    fn test_delete_rules() {
        let time = test_time();
        let mut store = Storefront::new(StoreConfig::default());

        let order_id = store
            .create_order(1, vec![item("tea", 10_000, 1)], &time)
            .unwrap();
        store.confirm_order(order_id, &time).unwrap();
        assert!(store.delete_order(order_id, &time).is_err());

        let order_id = store
            .create_order(1, vec![item("tea", 10_000, 1)], &time)
            .unwrap();
        store.delete_order(order_id, &time).unwrap();
        assert!(store.order(order_id).is_err());
    }

    #[test]
    fn test_campaign_over_order_history() {
        let time = test_time();
        let mut store = Storefront::new(StoreConfig::default());

        let order_id = store
            .create_order(42, vec![item("tea", 300_000, 2)], &time)
            .unwrap();
        store.confirm_order(order_id, &time).unwrap();

        let filter = CampaignFilter {
            start_date: time.now() - Duration::days(1),
            end_date: time.now() + Duration::days(1),
            min_amount: Money::from_major(500_000),
            max_amount: None,
            credit_percent: crate::decimal::Rate::from_percentage(10),
            expiry_days: 30,
        };

        let preview = store.preview_campaign(&filter).unwrap();
        assert_eq!(preview.len(), 1);
        assert_eq!(preview[0].proposed_credit, Money::from_major(60_000));

        let report = store.run_campaign(&filter, &time).unwrap();
        assert_eq!(report.granted.len(), 1);
        assert_eq!(
            store.total_balance(42, &time),
            Money::from_major(60_000)
        );
    }

    #[test]
    fn test_gift_grant_day_bounds() {
        let time = test_time();
        let mut store = Storefront::new(StoreConfig::default());

        assert!(store
            .grant_gift_credit(1, Money::from_major(10_000), 0, "gift", &time)
            .is_err());
        assert!(store
            .grant_gift_credit(1, Money::from_major(10_000), 366, "gift", &time)
            .is_err());
        assert!(store
            .grant_gift_credit(1, Money::from_major(10_000), 365, "gift", &time)
            .is_ok());
    }

    #[test]
    fn test_sweep_through_storefront() {
        let time = test_time();
        let controller = time.test_control().unwrap();
        let mut store = Storefront::new(StoreConfig::default());

        store
            .grant_gift_credit(1, Money::from_major(10_000), 1, "short", &time)
            .unwrap();
        store
            .grant_gift_credit(1, Money::from_major(20_000), 10, "long", &time)
            .unwrap();
        store.take_events();

        controller.advance(Duration::days(2));
        let report = store.sweep_expired_credits(&time);
        assert_eq!(report.removed_count, 1);
        assert_eq!(store.total_balance(1, &time), Money::from_major(20_000));
        assert!(store
            .take_events()
            .iter()
            .any(|e| matches!(e, Event::CreditExpired { .. })));
    }
}
