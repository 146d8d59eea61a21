//! Demonstration payloads: trades as the primary stream, quotes as the
//! reference stream.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A trade print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution price.
    pub price: Decimal,
    /// Executed quantity.
    pub volume: Decimal,
}

impl Trade {
    /// Create a trade.
    #[must_use]
    pub const fn new(price: Decimal, volume: Decimal) -> Self {
        Self { price, volume }
    }

    /// Price times volume.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price * self.volume
    }
}

/// A top-of-book quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
}

impl Quote {
    /// Create a quote.
    #[must_use]
    pub const fn new(bid: Decimal, ask: Decimal) -> Self {
        Self { bid, ask }
    }

    /// Ask minus bid.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// Midpoint of bid and ask.
    #[must_use]
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}
