//! Seeded trade/quote stream generation for benchmarks and scale runs.
//!
//! Streams are emitted in random (unsorted) order across groups, the way
//! they would arrive from an unordered scan, so generated data exercises the
//! sort as well as the merge. Equal settings always yield equal streams.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Event, Quote, Trade};

/// Shape of a synthetic dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    /// Number of trades.
    pub primaries: usize,
    /// Number of quotes.
    pub references: usize,
    /// Number of distinct symbols.
    pub groups: usize,
    /// RNG seed.
    pub seed: u64,
    /// First possible event time.
    pub start: DateTime<Utc>,
    /// Length of the time window, in milliseconds.
    pub window_ms: i64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            primaries: 1_000_000,
            references: 500_000,
            groups: 500,
            seed: 42,
            start: Utc
                .with_ymd_and_hms(2024, 1, 2, 9, 30, 0)
                .single()
                .unwrap_or_default(),
            // One trading session
            window_ms: 6 * 3_600_000 + 30 * 60_000,
        }
    }
}

impl SyntheticSpec {
    /// Same spec with both stream sizes multiplied by `factor`.
    #[must_use]
    pub const fn scaled(&self, factor: usize) -> Self {
        Self {
            primaries: self.primaries * factor,
            references: self.references * factor,
            groups: self.groups,
            seed: self.seed,
            start: self.start,
            window_ms: self.window_ms,
        }
    }
}

/// Symbol name of group `index`.
#[must_use]
pub fn symbol(index: usize) -> String {
    format!("SYM{index:04}")
}

/// Generate trades and quotes for `spec`.
#[must_use]
pub fn generate(spec: &SyntheticSpec) -> (Vec<Event<Trade>>, Vec<Event<Quote>>) {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let groups = spec.groups.max(1);
    let symbols: Vec<String> = (0..groups).map(symbol).collect();
    let window = spec.window_ms.max(1);

    let random_time =
        |rng: &mut StdRng| spec.start + TimeDelta::milliseconds(rng.random_range(0..window));

    let trades = (0..spec.primaries)
        .map(|i| {
            let group = rng.random_range(0..groups);
            let ts = random_time(&mut rng);
            let price = Decimal::new(rng.random_range(1_000..500_000), 2);
            let volume = Decimal::from(rng.random_range(1_u32..=1_000));
            Event::new(symbols[group].as_str(), ts, Trade::new(price, volume))
                .with_sequence(i as u64)
        })
        .collect();

    let quotes = (0..spec.references)
        .map(|i| {
            let group = rng.random_range(0..groups);
            let ts = random_time(&mut rng);
            let bid = Decimal::new(rng.random_range(1_000..500_000), 2);
            let ask = bid + Decimal::new(rng.random_range(1..50), 2);
            Event::new(symbols[group].as_str(), ts, Quote::new(bid, ask))
                .with_sequence(i as u64)
        })
        .collect();

    (trades, quotes)
}
