use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Per-tenant coefficients governing all four sub-scorers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringParameters {
    #[serde(default)]
    pub value: ValueThresholds,
    #[serde(default)]
    pub engagement: EngagementTuning,
    #[serde(default)]
    pub timeline: TimelineTuning,
    #[serde(default)]
    pub qualification: QualificationWeights,
}

impl ScoringParameters {
    /// Configured weight for a stage label, compared after lowercasing and trimming both sides.
    ///
    /// `None` means the stage has no weight at all, which is distinct from a configured zero.
    pub fn stage_weight(&self, status: &str) -> Option<f64> {
        self.qualification.weight_for(status)
    }

    /// Distinct stage labels from `statuses` that have no configured weight.
    pub fn unweighted_stages<'a, I>(&self, statuses: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut missing: Vec<String> = Vec::new();
        for status in statuses {
            let normalized = normalize_stage(status);
            if self.stage_weight(&normalized).is_none() && !missing.contains(&normalized) {
                missing.push(normalized);
            }
        }
        missing.sort();
        missing
    }
}

/// Ascending projected-value tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueThresholds {
    pub threshold_low: f64,
    pub threshold_medium: f64,
    pub threshold_high: f64,
}

impl Default for ValueThresholds {
    fn default() -> Self {
        Self {
            threshold_low: 1000.0,
            threshold_medium: 5000.0,
            threshold_high: 10000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementTuning {
    /// Displayed to tenants alongside the other knobs; the arithmetic does not gate on it.
    pub min_interactions: f64,
    pub optimal_interactions: f64,
    /// Days of silence that cost one recency point.
    pub recency_weight: f64,
}

impl Default for EngagementTuning {
    fn default() -> Self {
        Self {
            min_interactions: 1.0,
            optimal_interactions: 3.0,
            recency_weight: 7.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineTuning {
    /// Days overdue that cost one timeline point.
    pub overdue_penalty: f64,
    /// Days beyond the optimal window that cost one timeline point.
    pub upcoming_bonus: f64,
    pub optimal_days_ahead: f64,
}

impl Default for TimelineTuning {
    fn default() -> Self {
        Self {
            overdue_penalty: 3.0,
            upcoming_bonus: 2.0,
            optimal_days_ahead: 7.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationWeights {
    /// Labels must stay distinct after trimming and lowercasing; colliding labels fail to parse.
    #[serde(default, deserialize_with = "distinct_stage_labels")]
    pub stage_weights: BTreeMap<String, f64>,
}

impl QualificationWeights {
    /// Weight of the first label, in key order, matching `status` once both are normalized.
    /// Parsed profiles never hold two such labels.
    pub fn weight_for(&self, status: &str) -> Option<f64> {
        let wanted = normalize_stage(status);
        self.stage_weights
            .iter()
            .find(|(label, _)| normalize_stage(label) == wanted)
            .map(|(_, weight)| *weight)
    }
}

impl Default for QualificationWeights {
    fn default() -> Self {
        let stage_weights = [
            ("new", 2.0),
            ("contacted", 4.0),
            ("qualified", 6.0),
            ("negotiation", 8.0),
            ("won", 10.0),
            ("lost", 0.0),
        ]
        .into_iter()
        .map(|(label, weight)| (label.to_string(), weight))
        .collect();

        Self { stage_weights }
    }
}

fn distinct_stage_labels<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let weights = BTreeMap::<String, f64>::deserialize(deserializer)?;
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for label in weights.keys() {
        if let Some(previous) = seen.insert(normalize_stage(label), label.as_str()) {
            return Err(serde::de::Error::custom(format!(
                "stage labels '{previous}' and '{label}' name the same stage"
            )));
        }
    }
    Ok(weights)
}

pub(crate) fn normalize_stage(label: &str) -> String {
    label.trim().to_lowercase()
}
