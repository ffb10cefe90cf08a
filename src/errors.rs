use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{CreditId, OrderId, OrderStatus, UserId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("expiry must be in the future: {expires_at}")]
    InvalidExpiry {
        expires_at: DateTime<Utc>,
    },

    #[error("expiry days out of range: {days} (allowed 0..={max})")]
    InvalidExpiryDays {
        days: u32,
        max: u32,
    },

    #[error("percent out of range: {percent}")]
    InvalidPercent {
        percent: Rate,
    },

    #[error("invalid date range: start {start}, end {end}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("invalid quantity: {quantity}")]
    InvalidQuantity {
        quantity: u32,
    },

    #[error("user not found: {user_id}")]
    UserNotFound {
        user_id: UserId,
    },

    #[error("order not found: {order_id}")]
    OrderNotFound {
        order_id: OrderId,
    },

    #[error("credit not found: {credit_id}")]
    CreditNotFound {
        credit_id: CreditId,
    },

    #[error("discount code not found: {code}")]
    DiscountNotFound {
        code: String,
    },

    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Money,
        requested: Money,
    },

    #[error("balance changed between plan and commit: {message}")]
    ConcurrencyConflict {
        message: String,
    },

    #[error("order not editable: current status is {status:?}")]
    OrderNotEditable {
        status: OrderStatus,
    },

    #[error("order has expired: {order_id}")]
    OrderExpired {
        order_id: OrderId,
    },

    #[error("cannot remove the last remaining item of order {order_id}")]
    LastItemRemoval {
        order_id: OrderId,
    },

    #[error("order must contain at least one item")]
    EmptyOrder,

    #[error("item index {index} out of range: order has {len} items")]
    ItemIndexOutOfRange {
        index: usize,
        len: usize,
    },

    #[error("discount code not applicable: {reason}")]
    DiscountNotApplicable {
        reason: String,
    },

    #[error("persistence failure: {message}")]
    Persistence {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
