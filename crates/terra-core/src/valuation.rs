//! Estimated GDP derived from population and exchange rate.
//!
//! The estimate is deliberately rough: every call draws a fresh multiplier,
//! so two refreshes of identical source data produce different values. The
//! random source is a parameter, which keeps the arithmetic testable with a
//! seeded generator or a fixed multiplier.

use rand::Rng;
use rust_decimal::Decimal;
use tracing::warn;

/// Multiplier bounds in millionths: the draw is uniform over `[1000, 2000)`.
const MULTIPLIER_SCALE: u32 = 6;
const MULTIPLIER_MIN_MICROS: i64 = 1_000_000_000;
const MULTIPLIER_MAX_MICROS: i64 = 2_000_000_000;

/// Decimal places kept in the estimate.
pub const ESTIMATE_DP: u32 = 2;

/// Draws a multiplier uniformly from `[1000, 2000)` at micro-unit resolution.
pub fn draw_multiplier<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    let micros = rng.gen_range(MULTIPLIER_MIN_MICROS..MULTIPLIER_MAX_MICROS);
    Decimal::new(micros, MULTIPLIER_SCALE)
}

/// Estimates GDP as `population * multiplier / rate`, rounded to 2 places.
///
/// Returns `None` when the rate is absent, zero or negative; the caller
/// decides what that means for the record.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use rust_decimal::Decimal;
/// use terra_core::valuation::estimate;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let rate = Decimal::new(85, 2); // 0.85
/// let gdp = estimate(29_000, Some(rate), &mut rng).unwrap();
/// assert!(gdp >= Decimal::from(29_000 * 1000) / rate);
/// assert!(estimate(29_000, None, &mut rng).is_none());
/// ```
pub fn estimate<R: Rng + ?Sized>(
    population: u64,
    rate: Option<Decimal>,
    rng: &mut R,
) -> Option<Decimal> {
    let rate = rate.filter(|r| *r > Decimal::ZERO)?;
    estimate_with_multiplier(population, rate, draw_multiplier(rng))
}

/// Deterministic core of [`estimate`] for a given multiplier.
///
/// Uses banker's rounding, the same mode decimal contexts default to.
/// Returns `None` if the rate is not positive or the result overflows
/// `Decimal`.
pub fn estimate_with_multiplier(
    population: u64,
    rate: Decimal,
    multiplier: Decimal,
) -> Option<Decimal> {
    if rate <= Decimal::ZERO {
        return None;
    }

    let result = Decimal::from(population)
        .checked_mul(multiplier)
        .and_then(|v| v.checked_div(rate));

    match result {
        Some(value) => Some(value.round_dp(ESTIMATE_DP)),
        None => {
            warn!(
                "Estimated GDP overflows decimal range (population {}, rate {})",
                population, rate
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn test_absent_rate() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(estimate(1_000, None, &mut rng), None);
    }

    #[test]
    fn test_zero_rate() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(estimate(1_000, Some(Decimal::ZERO), &mut rng), None);
        assert_eq!(estimate_with_multiplier(1_000, dec!(0.000), dec!(1500)), None);
    }

    #[test]
    fn test_negative_rate() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(estimate(1_000, Some(dec!(-1.5)), &mut rng), None);
    }

    #[test]
    fn test_fixed_multiplier_arithmetic() {
        // 29000 * 1500 / 0.85 = 51176470.588235...
        assert_eq!(
            estimate_with_multiplier(29_000, dec!(0.85), dec!(1500)),
            Some(dec!(51176470.59))
        );
    }

    #[test]
    fn test_rounds_half_to_even() {
        // 1 * 1000.125 / 1 -> 1000.12 under banker's rounding
        assert_eq!(
            estimate_with_multiplier(1, dec!(1), dec!(1000.125)),
            Some(dec!(1000.12))
        );
        assert_eq!(
            estimate_with_multiplier(1, dec!(1), dec!(1000.135)),
            Some(dec!(1000.14))
        );
    }

    #[test]
    fn test_zero_population() {
        assert_eq!(
            estimate_with_multiplier(0, dec!(3.5), dec!(1234)),
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn test_large_population_is_exact() {
        // 1_400_000_000 * 2000 / 7 = 400_000_000_000
        assert_eq!(
            estimate_with_multiplier(1_400_000_000, dec!(7), dec!(2000)),
            Some(dec!(400000000000.00))
        );
    }

    #[test]
    fn test_multiplier_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let m = draw_multiplier(&mut rng);
            assert!(m >= dec!(1000));
            assert!(m < dec!(2000));
        }
    }

    #[test]
    fn test_estimate_within_bounds() {
        let rate = dec!(0.85);
        let population = 29_000_u64;
        let low = estimate_with_multiplier(population, rate, dec!(1000)).unwrap();
        let high = estimate_with_multiplier(population, rate, dec!(2000)).unwrap();

        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..1_000 {
            let gdp = estimate(population, Some(rate), &mut rng).unwrap();
            assert!(gdp >= low && gdp <= high, "{} outside [{}, {}]", gdp, low, high);
            assert!(gdp.scale() <= ESTIMATE_DP);
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        assert_eq!(
            estimate(5_000_000, Some(dec!(12.5)), &mut a),
            estimate(5_000_000, Some(dec!(12.5)), &mut b)
        );
    }

    #[test]
    fn test_estimates_vary_between_draws() {
        let mut rng = StdRng::seed_from_u64(3);
        let first = estimate(10_000_000, Some(dec!(1)), &mut rng);
        let differs = (0..20).any(|_| estimate(10_000_000, Some(dec!(1)), &mut rng) != first);
        assert!(differs);
    }

    #[test]
    fn test_overflow_yields_none() {
        assert_eq!(
            estimate_with_multiplier(u64::MAX, dec!(0.0000000000000000000000000001), dec!(1999)),
            None
        );
    }
}
