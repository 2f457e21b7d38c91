use crate::scoring::params::ValueThresholds;

/// Tiered lookup on projected value: 10 / 7 / 4 / 2. No interpolation between tiers.
pub(crate) fn score(projected_value: f64, tiers: &ValueThresholds) -> u8 {
    if projected_value >= tiers.threshold_high {
        10
    } else if projected_value >= tiers.threshold_medium {
        7
    } else if projected_value >= tiers.threshold_low {
        4
    } else {
        2
    }
}
