/// quick start - minimal example to get started
use store_credit_rs::{LineItem, Money, StoreConfig, Storefront};
use store_credit_rs::{SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut store = Storefront::new(StoreConfig::default());

    // top up a customer's wallet
    store.charge_permanent_credit(1001, Money::from_major(150_000), "admin top-up", &time)?;

    // the customer checks out a small order
    let order_id = store.create_order(
        1001,
        vec![LineItem {
            product_id: 1,
            pack_id: 1,
            product_name: "green tea".to_string(),
            pack_name: "500g box".to_string(),
            unit_price: Money::from_major(45_000),
            quantity: 2,
            notes: None,
        }],
        &time,
    )?;
    store.approve_order(order_id, &time)?;

    // pay from the wallet
    let outcome = store.apply_wallet_payment(order_id, &time)?;
    println!("applied: {}", outcome.applied_amount);
    println!("remaining due: {}", outcome.remaining_due);
    println!("fully paid: {}", outcome.fully_paid);

    println!("wallet balance: {}", store.permanent_balance(1001));

    Ok(())
}
