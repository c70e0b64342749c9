//! Amount Partitioner
//!
//! Splits a trade amount into the fixed percent ladder that every route is
//! quoted at.

use num_bigint::BigUint;
use waypoint_core::ConfigError;

/// Parallel percent and amount ladders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountDistribution {
    /// `[step, 2*step, ..., 100]`
    pub percents: Vec<u8>,
    /// `amounts[i] = floor(total * percents[i] / 100)`
    pub amounts: Vec<BigUint>,
}

/// Partition `total` in increments of `step` percent.
///
/// Each amount is computed from `total` directly, so rounding never
/// accumulates along the ladder.
pub fn amount_distribution(total: &BigUint, step: u8) -> Result<AmountDistribution, ConfigError> {
    if step == 0 || step > 100 || 100 % step != 0 {
        return Err(ConfigError::InvalidDistributionPercent { percent: step });
    }

    let percents: Vec<u8> = (1..=100 / step).map(|i| i * step).collect();
    let amounts = percents
        .iter()
        .map(|p| total * BigUint::from(*p) / BigUint::from(100u8))
        .collect();

    Ok(AmountDistribution { percents, amounts })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(values: &[u64]) -> Vec<BigUint> {
        values.iter().map(|v| BigUint::from(*v)).collect()
    }

    #[test]
    fn test_quarter_ladder() {
        let dist = amount_distribution(&BigUint::from(1000u32), 25).unwrap();
        assert_eq!(dist.percents, vec![25, 50, 75, 100]);
        assert_eq!(dist.amounts, amounts(&[250, 500, 750, 1000]));
    }

    #[test]
    fn test_floor_rounding_from_total() {
        let dist = amount_distribution(&BigUint::from(7u32), 50).unwrap();
        assert_eq!(dist.amounts, amounts(&[3, 7]));

        let dist = amount_distribution(&BigUint::from(999u32), 5).unwrap();
        assert_eq!(dist.percents.len(), 20);
        assert_eq!(dist.amounts[0], BigUint::from(49u32));
        assert_eq!(dist.amounts[2], BigUint::from(149u32));
        assert_eq!(dist.amounts[19], BigUint::from(999u32));
    }

    #[test]
    fn test_large_amounts_are_exact() {
        // 10^30 raw units, well beyond u64
        let total = BigUint::from(10u32).pow(30);
        let dist = amount_distribution(&total, 10).unwrap();
        assert_eq!(dist.amounts[2], BigUint::from(3u32) * BigUint::from(10u32).pow(29));
        assert_eq!(dist.amounts[9], total);
    }

    #[test]
    fn test_rejects_bad_step() {
        for step in [0u8, 3, 30, 101, 255] {
            assert!(matches!(
                amount_distribution(&BigUint::from(100u32), step),
                Err(ConfigError::InvalidDistributionPercent { percent }) if percent == step
            ));
        }
        let whole = amount_distribution(&BigUint::from(100u32), 100).unwrap();
        assert_eq!(whole.percents, vec![100]);
    }
}
