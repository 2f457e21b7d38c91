//! Deterministic lead scoring.
//!
//! Four independent sub-scorers read their own slice of the inputs and produce a 0-10
//! integer each; the aggregator averages the already-rounded sub-scores. The caller supplies
//! the as-of instant so the result is a pure function of the arguments.

mod aggregate;
mod engagement;
mod qualification;
mod timeline;
mod value;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{Interaction, Lead, ScoreResult};
use super::params::ScoringParameters;

/// Score a lead against a tenant's parameters as of the given instant.
pub fn compute_lead_score(
    lead: &Lead,
    interactions: &[Interaction],
    params: &ScoringParameters,
    as_of: DateTime<Utc>,
) -> ScoreResult {
    let value_score = value::score(lead.projected_value, &params.value);
    let engagement_score = engagement::score(interactions, &params.engagement, as_of);
    let timeline_score = timeline::score(
        lead.follow_up_date,
        &params.timeline,
        as_of.date_naive(),
    );
    let qualification_score = match qualification::score(&lead.status, params) {
        Some(score) => score,
        None => {
            warn!(
                lead_id = %lead.id,
                tenant_id = %lead.tenant_id,
                stage = %lead.status,
                "stage has no configured weight; qualification scored as 0"
            );
            0
        }
    };

    aggregate::combine(
        value_score,
        engagement_score,
        timeline_score,
        qualification_score,
    )
}

/// Scoring bound to one tenant's parameters.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    params: ScoringParameters,
}

impl ScoringEngine {
    pub fn new(params: ScoringParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ScoringParameters {
        &self.params
    }

    pub fn score(
        &self,
        lead: &Lead,
        interactions: &[Interaction],
        as_of: DateTime<Utc>,
    ) -> ScoreResult {
        compute_lead_score(lead, interactions, &self.params, as_of)
    }
}

/// Round half up onto the 0-10 scale. NaN collapses to 0.
pub(crate) fn to_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 10.0) as u8
}
