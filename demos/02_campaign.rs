/// campaign - percentage credit back on confirmed order history
use store_credit_rs::{CampaignFilter, LineItem, Money, Rate, StoreConfig, Storefront};
use store_credit_rs::{SafeTimeProvider, TimeSource};
use chrono::{Duration, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== campaign example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    ));
    let mut store = Storefront::new(StoreConfig::default());

    // build some confirmed order history
    for (user, unit, qty) in [(3001, 300_000, 2), (3002, 250_000, 3), (3003, 100_000, 1)] {
        let order_id = store.create_order(
            user,
            vec![LineItem {
                product_id: 1,
                pack_id: 1,
                product_name: "black tea".to_string(),
                pack_name: "1kg bag".to_string(),
                unit_price: Money::from_major(unit),
                quantity: qty,
                notes: None,
            }],
            &time,
        )?;
        store.confirm_order(order_id, &time)?;
    }

    // 10% back as 30-day gift credit for confirmed spend over 500k
    let filter = CampaignFilter {
        start_date: time.now() - Duration::days(30),
        end_date: time.now(),
        min_amount: Money::from_major(500_000),
        max_amount: None,
        credit_percent: Rate::from_percentage(10),
        expiry_days: 30,
    };

    println!("preview:");
    for user in store.preview_campaign(&filter)? {
        println!(
            "  user {} spent {} -> credit {}",
            user.user_id, user.aggregated_spend, user.proposed_credit
        );
    }

    let report = store.run_campaign(&filter, &time)?;
    println!("\nrun {}: granted {} users, {} total credit", report.run_id, report.granted.len(), report.total_credit);
    for (user_id, reason) in &report.failures {
        println!("  failed for {}: {}", user_id, reason);
    }

    for user in [3001, 3002, 3003] {
        println!("user {} balance: {}", user, store.total_balance(user, &time));
    }

    Ok(())
}
