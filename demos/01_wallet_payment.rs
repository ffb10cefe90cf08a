/// wallet payment - gift credit drains before permanent balance
use store_credit_rs::{LineItem, Money, StoreConfig, Storefront};
use store_credit_rs::{SafeTimeProvider, TimeSource};
use chrono::{Duration, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== wallet payment example ===\n");

    // controlled time so credit expiry is deterministic
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();
    let mut store = Storefront::new(StoreConfig::default());

    let user = 2001;

    // a gift credit expiring in 2 days, plus a permanent balance
    store.grant_gift_credit(user, Money::from_major(50_000), 2, "welcome gift", &time)?;
    store.charge_permanent_credit(user, Money::from_major(200_000), "top-up", &time)?;
    println!("total balance: {}", store.total_balance(user, &time));

    // a 120k order
    let order_id = store.create_order(
        user,
        vec![LineItem {
            product_id: 7,
            pack_id: 2,
            product_name: "saffron".to_string(),
            pack_name: "5g tin".to_string(),
            unit_price: Money::from_major(60_000),
            quantity: 2,
            notes: None,
        }],
        &time,
    )?;
    store.approve_order(order_id, &time)?;

    // preview how the payment will draw down credit
    let plan = store.plan_wallet_payment(user, Money::from_major(120_000), &time)?;
    for step in &plan.steps {
        println!("plan step: {:?} -> {}", step.source, step.amount);
    }

    // the expiring gift goes first, permanent tops up the rest
    let outcome = store.apply_wallet_payment(order_id, &time)?;
    println!("\napplied {} across {} transactions", outcome.applied_amount, outcome.transaction_ids.len());
    println!("order fully paid: {}", outcome.fully_paid);
    println!("permanent balance left: {}", store.permanent_balance(user));
    println!("active gift credits: {}", store.active_gift_credits(user, &time).len());

    // days later, the reaper finds nothing to forfeit for this user
    controller.advance(Duration::days(3));
    let report = store.sweep_expired_credits(&time);
    println!("\nreaper removed {} credits, forfeited {}", report.removed_count, report.forfeited_total);

    // recent wallet activity
    println!("\nrecent transactions:");
    for tx in store.recent_transactions(user) {
        println!("  #{} {:?} {}", tx.id, tx.wallet_type, tx.amount);
    }

    Ok(())
}
