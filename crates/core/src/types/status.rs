//! Status and mode enums shared between the storefront and the backend.

use serde::{Deserialize, Serialize};

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Fulfillment {
    #[default]
    Delivery,
    Pickup,
}

impl Fulfillment {
    /// Whether the order needs a delivery address.
    #[must_use]
    pub const fn needs_address(self) -> bool {
        matches!(self, Self::Delivery)
    }
}

/// How a selected modifier affects the item's unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierPricing {
    /// Modifier price is added on top of the item price.
    Add,
    /// Modifier price replaces the item price.
    Replace,
}

/// Order status, mirrored from the backend's numeric status code.
///
/// The backend owns the order lifecycle. Unknown codes are preserved so a
/// newer backend never breaks order display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum OrderStatus {
    AwaitingPayment,
    Paid,
    Accepted,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Completed,
    Cancelled,
    Unknown(i32),
}

impl OrderStatus {
    /// Numeric code as used by the backend.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::AwaitingPayment => 0,
            Self::Paid => 1,
            Self::Accepted => 2,
            Self::Preparing => 3,
            Self::ReadyForPickup => 4,
            Self::OutForDelivery => 5,
            Self::Completed => 6,
            Self::Cancelled => 7,
            Self::Unknown(code) => code,
        }
    }

    /// Whether the order can no longer change.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl From<i32> for OrderStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::AwaitingPayment,
            1 => Self::Paid,
            2 => Self::Accepted,
            3 => Self::Preparing,
            4 => Self::ReadyForPickup,
            5 => Self::OutForDelivery,
            6 => Self::Completed,
            7 => Self::Cancelled,
            other => Self::Unknown(other),
        }
    }
}

impl From<OrderStatus> for i32 {
    fn from(status: OrderStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingPayment => write!(f, "awaiting_payment"),
            Self::Paid => write!(f, "paid"),
            Self::Accepted => write!(f, "accepted"),
            Self::Preparing => write!(f, "preparing"),
            Self::ReadyForPickup => write!(f, "ready_for_pickup"),
            Self::OutForDelivery => write!(f, "out_for_delivery"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}
