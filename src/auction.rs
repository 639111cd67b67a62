//! Dutch auction pricer
//!
//! Stateless rate computation for resolver competition. The rate a resolver
//! must accept decays monotonically from a maker-favorable start toward a
//! floor; the first resolver for whom the current rate clears their own
//! minimum takes the order. Rates are fixed-point integers scaled by
//! [`RATE_SCALE`], so a 1:1 exchange rate is `1_000_000_000`.

use crate::error::{SwapError, SwapResult};
use serde::{Deserialize, Serialize};

/// Fixed-point scale for exchange rates (1e9 = 1.0)
pub const RATE_SCALE: u128 = 1_000_000_000;

/// Parameters of one order's price decay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    /// Unix seconds the decay begins
    pub auction_start: u64,
    /// Decay duration in seconds
    pub duration: u64,
    /// Maker-favorable opening rate, scaled by [`RATE_SCALE`]
    pub start_rate: u128,
    /// Resolver-favorable floor rate, scaled by [`RATE_SCALE`]
    pub end_rate: u128,
}

impl AuctionParams {
    pub fn new(auction_start: u64, duration: u64, start_rate: u128, end_rate: u128) -> SwapResult<Self> {
        if duration == 0 {
            return Err(SwapError::Config("auction duration must be non-zero".into()));
        }
        if start_rate < end_rate {
            return Err(SwapError::Config(format!(
                "auction start rate {} below floor rate {}",
                start_rate, end_rate
            )));
        }
        if end_rate == 0 {
            return Err(SwapError::Config("auction floor rate must be non-zero".into()));
        }
        // Bounds the interpolation product in `current_rate`
        if start_rate.checked_mul(duration as u128).is_none() {
            return Err(SwapError::InvalidAmount(format!(
                "auction start rate {} too large for a {}s decay",
                start_rate, duration
            )));
        }
        Ok(Self {
            auction_start,
            duration,
            start_rate,
            end_rate,
        })
    }

    /// Rate at `now`, clamped to the boundary rates outside the decay window
    pub fn current_rate(&self, now: u64) -> u128 {
        current_rate(
            self.auction_start,
            self.duration,
            self.start_rate,
            self.end_rate,
            now,
        )
    }
}

/// Linear interpolation from `start_rate` down to `end_rate` over
/// `[auction_start, auction_start + duration]`. Times outside the window
/// clamp to the nearest boundary rate.
pub fn current_rate(
    auction_start: u64,
    duration: u64,
    start_rate: u128,
    end_rate: u128,
    now: u64,
) -> u128 {
    if now <= auction_start || duration == 0 {
        return start_rate;
    }
    let elapsed = now - auction_start;
    if elapsed >= duration {
        return end_rate;
    }
    let span = start_rate.saturating_sub(end_rate);
    match span.checked_mul(elapsed as u128) {
        Some(product) => start_rate - product / duration as u128,
        // unreachable for params built via `AuctionParams::new`
        None => end_rate,
    }
}

/// Whether `rate` clears the resolver's own minimum
pub fn is_profitable(rate: u128, resolver_min_rate: u128) -> bool {
    rate >= resolver_min_rate
}

/// Taking-side amount implied by a making amount at `rate`
pub fn taking_amount_at(making_amount: u128, rate: u128) -> SwapResult<u128> {
    making_amount
        .checked_mul(rate)
        .map(|scaled| scaled / RATE_SCALE)
        .ok_or_else(|| {
            SwapError::InvalidAmount(format!(
                "making amount {} too large to price at rate {}",
                making_amount, rate
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u64 = 10_000;
    const DURATION: u64 = 300;
    const HIGH: u128 = 2 * RATE_SCALE;
    const FLOOR: u128 = RATE_SCALE;

    #[test]
    fn clamps_before_start() {
        assert_eq!(current_rate(START, DURATION, HIGH, FLOOR, 0), HIGH);
        assert_eq!(current_rate(START, DURATION, HIGH, FLOOR, START), HIGH);
    }

    #[test]
    fn clamps_after_end() {
        assert_eq!(current_rate(START, DURATION, HIGH, FLOOR, START + DURATION), FLOOR);
        assert_eq!(current_rate(START, DURATION, HIGH, FLOOR, u64::MAX), FLOOR);
    }

    #[test]
    fn decays_linearly() {
        let half = current_rate(START, DURATION, HIGH, FLOOR, START + DURATION / 2);
        assert_eq!(half, RATE_SCALE + RATE_SCALE / 2);

        let third = current_rate(START, DURATION, HIGH, FLOOR, START + 100);
        assert_eq!(third, HIGH - RATE_SCALE / 3);
    }

    #[test]
    fn decay_is_monotone() {
        let mut last = u128::MAX;
        for t in (START..=START + DURATION).step_by(7) {
            let rate = current_rate(START, DURATION, HIGH, FLOOR, t);
            assert!(rate <= last);
            last = rate;
        }
    }

    #[test]
    fn flat_auction_holds_rate() {
        assert_eq!(current_rate(START, DURATION, FLOOR, FLOOR, START + 150), FLOOR);
    }

    #[test]
    fn profitability_boundary() {
        assert!(is_profitable(FLOOR, FLOOR));
        assert!(is_profitable(FLOOR + 1, FLOOR));
        assert!(!is_profitable(FLOOR - 1, FLOOR));
    }

    #[test]
    fn params_validate_shape() {
        assert!(AuctionParams::new(START, 0, HIGH, FLOOR).is_err());
        assert!(AuctionParams::new(START, DURATION, FLOOR, HIGH).is_err());
        assert!(AuctionParams::new(START, DURATION, HIGH, 0).is_err());
        assert!(AuctionParams::new(START, DURATION, u128::MAX, FLOOR).is_err());

        let p = AuctionParams::new(START, DURATION, HIGH, FLOOR).unwrap();
        assert_eq!(p.current_rate(START + DURATION), FLOOR);
    }

    #[test]
    fn taking_amount_scales_by_rate() {
        assert_eq!(taking_amount_at(1_000, RATE_SCALE).unwrap(), 1_000);
        assert_eq!(taking_amount_at(1_000, RATE_SCALE + RATE_SCALE / 2).unwrap(), 1_500);
    }

    #[test]
    fn taking_amount_rejects_overflow() {
        assert!(matches!(
            taking_amount_at(u128::MAX, 2),
            Err(SwapError::InvalidAmount(_))
        ));
    }
}
