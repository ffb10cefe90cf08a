pub mod campaign;
pub mod config;
pub mod decimal;
pub mod discount;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod orders;
pub mod storefront;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use errors::{Result, StoreError};
pub use events::{Event, EventStore};
pub use campaign::{
    CampaignEligibilityEngine, CampaignFilter, CampaignReport, EligibleUser,
};
pub use config::StoreConfig;
pub use discount::DiscountCode;
pub use ledger::{
    ConsumptionPlan, ConsumptionSource, CreditConsumptionPlanner, ExpiryReaper, PlanStep,
    SweepReport, TemporaryCredit, WalletLedger, WalletSnapshot, WalletStatistics,
    WalletTransaction,
};
pub use orders::{LineItem, Order, PricingEngine, PricingOutcome};
pub use storefront::{Storefront, WalletPaymentOutcome};
pub use types::{
    CreditId, DiscountKind, OrderId, OrderStatus, TransactionId, UserId, WalletType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
