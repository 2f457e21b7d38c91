use chrono::{DateTime, Utc};

use super::to_score;
use crate::scoring::domain::Interaction;
use crate::scoring::params::EngagementTuning;

/// Average of a recency component and a frequency component.
///
/// ```text
/// recency   = max(0, 10 - daysSinceLast / recency_weight)
/// frequency = round(min(10, (sum of weights / optimal_interactions) * 10))
/// score     = round((recency + frequency) / 2)
/// ```
///
/// Negative interactions are dropped; neutral ones count half. No weighted interactions
/// scores 0.
pub(crate) fn score(
    interactions: &[Interaction],
    tuning: &EngagementTuning,
    as_of: DateTime<Utc>,
) -> u8 {
    let weighted: Vec<(DateTime<Utc>, f64)> = interactions
        .iter()
        .filter_map(|interaction| {
            interaction
                .sentiment
                .weight()
                .map(|weight| (interaction.created_at, weight))
        })
        .collect();

    let Some(most_recent) = weighted.iter().map(|(created_at, _)| *created_at).max() else {
        return 0;
    };

    // Interactions stamped after the as-of instant count as same-day contact.
    let days_since_last = (as_of - most_recent).num_days().max(0) as f64;
    let recency = recency_component(days_since_last, tuning.recency_weight);

    let effective_count: f64 = weighted.iter().map(|(_, weight)| weight).sum();
    let frequency = frequency_component(effective_count, tuning.optimal_interactions);

    to_score((recency + frequency) / 2.0)
}

fn recency_component(days_since_last: f64, recency_weight: f64) -> f64 {
    if recency_weight > 0.0 {
        (10.0 - days_since_last / recency_weight).max(0.0)
    } else if days_since_last == 0.0 {
        10.0
    } else {
        0.0
    }
}

fn frequency_component(effective_count: f64, optimal_interactions: f64) -> f64 {
    if optimal_interactions > 0.0 {
        ((effective_count / optimal_interactions) * 10.0)
            .min(10.0)
            .round()
    } else {
        10.0
    }
}
