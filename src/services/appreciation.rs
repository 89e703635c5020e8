// Price appreciation applied to a player's market value on every sale.
// The multiplier is (100 + r) / 100 with integer r drawn from [10, 99].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const MIN_APPRECIATION_PERCENT: u32 = 10;
pub const MAX_APPRECIATION_PERCENT: u32 = 99;

/// Source of the appreciation percentage `r`
pub trait AppreciationSource: Send + Sync {
    /// Next percentage; values outside [10, 99] are clamped by the caller
    fn next_percent(&self) -> u32;
}

/// Production source backed by the OS-seeded thread-local CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomAppreciation;

impl AppreciationSource for RandomAppreciation {
    fn next_percent(&self) -> u32 {
        rand::thread_rng().gen_range(MIN_APPRECIATION_PERCENT..=MAX_APPRECIATION_PERCENT)
    }
}

/// Reproducible pseudo-random source
pub struct SeededAppreciation {
    rng: Mutex<StdRng>,
}

impl SeededAppreciation {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl AppreciationSource for SeededAppreciation {
    fn next_percent(&self) -> u32 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(MIN_APPRECIATION_PERCENT..=MAX_APPRECIATION_PERCENT)
    }
}

/// Replays a fixed list of percentages, cycling when exhausted
pub struct SequenceAppreciation {
    values: Vec<u32>,
    cursor: AtomicUsize,
}

impl SequenceAppreciation {
    pub fn new(values: Vec<u32>) -> Self {
        assert!(!values.is_empty(), "sequence needs at least one value");
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn constant(percent: u32) -> Self {
        Self::new(vec![percent])
    }
}

impl AppreciationSource for SequenceAppreciation {
    fn next_percent(&self) -> u32 {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[i % self.values.len()]
    }
}

/// New market value for a player sold at `price`
///
/// # Example
/// ```
/// use transfer_market_api::services::appreciation::appreciate;
/// use rust_decimal::Decimal;
///
/// assert_eq!(appreciate(Decimal::from(100_000), 10), Decimal::from(110_000));
/// assert_eq!(appreciate(Decimal::from(100_000), 99), Decimal::from(199_000));
/// ```
pub fn appreciate(price: Decimal, percent: u32) -> Decimal {
    let percent = percent.clamp(MIN_APPRECIATION_PERCENT, MAX_APPRECIATION_PERCENT);
    price * Decimal::from(100 + percent) / Decimal::from(100)
}
