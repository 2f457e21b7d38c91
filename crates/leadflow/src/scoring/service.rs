use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Interaction, InteractionEdit, InteractionId, LeadId, ScoreBand, ScoreResult, TenantId,
};
use super::engine::compute_lead_score;
use super::params::ScoringParameters;
use super::repository::{
    InteractionRepository, LeadRecord, LeadRepository, RepositoryError, ScoredLeadView,
    ScoringProfileRepository,
};

/// Service composing the lead, interaction, and profile stores with the scoring engine.
pub struct LeadScoringService<L, I, P> {
    leads: Arc<L>,
    interactions: Arc<I>,
    profiles: Arc<P>,
}

/// Everything one scoring pass reads, fetched up front.
struct ScoringInputs {
    record: LeadRecord,
    interactions: Vec<Interaction>,
    params: ScoringParameters,
}

impl<L, I, P> LeadScoringService<L, I, P>
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    pub fn new(leads: Arc<L>, interactions: Arc<I>, profiles: Arc<P>) -> Self {
        Self {
            leads,
            interactions,
            profiles,
        }
    }

    /// Compute a lead's scores without writing them back.
    pub fn preview(
        &self,
        lead_id: &LeadId,
        as_of: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoringServiceError> {
        let inputs = self.load_inputs(lead_id)?;
        Ok(compute_lead_score(
            &inputs.record.lead,
            &inputs.interactions,
            &inputs.params,
            as_of,
        ))
    }

    /// Compute and persist a lead's scores.
    ///
    /// A failed write still hands back the computed result inside
    /// [`ScoringServiceError::Persist`].
    pub fn rescore(
        &self,
        lead_id: &LeadId,
        as_of: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoringServiceError> {
        let inputs = self.load_inputs(lead_id)?;
        self.score_and_persist(inputs, as_of)
    }

    /// Write computed scores onto the lead record.
    pub fn persist_lead_score(
        &self,
        lead_id: &LeadId,
        result: &ScoreResult,
    ) -> Result<(), ScoringServiceError> {
        self.leads
            .update_scores(lead_id, result)
            .map_err(|source| {
                warn!(%lead_id, error = %source, "failed to persist lead scores");
                ScoringServiceError::Persist {
                    result: *result,
                    source,
                }
            })
    }

    /// Store a new interaction and rescore the lead it belongs to.
    ///
    /// Every read happens before the write, so a missing lead or profile leaves the
    /// interaction store untouched.
    pub fn record_interaction(
        &self,
        interaction: Interaction,
        as_of: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoringServiceError> {
        let mut inputs = self.load_inputs(&interaction.lead_id)?;

        self.interactions
            .insert(interaction.clone())
            .map_err(ScoringServiceError::Interaction)?;
        inputs.interactions.push(interaction);

        self.score_and_persist(inputs, as_of)
    }

    /// Correct a stored interaction of `lead_id` and rescore the lead.
    pub fn edit_interaction(
        &self,
        lead_id: &LeadId,
        interaction_id: &InteractionId,
        edit: &InteractionEdit,
        as_of: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoringServiceError> {
        let mut inputs = self.load_inputs(lead_id)?;
        let interaction = inputs
            .interactions
            .iter_mut()
            .find(|interaction| &interaction.id == interaction_id)
            .ok_or_else(|| ScoringServiceError::InteractionNotFound(interaction_id.clone()))?;
        edit.apply(interaction);

        self.interactions
            .update(interaction.clone())
            .map_err(ScoringServiceError::Interaction)?;

        self.score_and_persist(inputs, as_of)
    }

    /// Delete an interaction of `lead_id` and rescore the lead without it.
    pub fn delete_interaction(
        &self,
        lead_id: &LeadId,
        interaction_id: &InteractionId,
        as_of: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoringServiceError> {
        let mut inputs = self.load_inputs(lead_id)?;
        let position = inputs
            .interactions
            .iter()
            .position(|interaction| &interaction.id == interaction_id)
            .ok_or_else(|| ScoringServiceError::InteractionNotFound(interaction_id.clone()))?;

        self.interactions
            .remove(interaction_id)
            .map_err(ScoringServiceError::Interaction)?;
        inputs.interactions.remove(position);

        self.score_and_persist(inputs, as_of)
    }

    /// Save a tenant's parameters and recompute every lead they govern.
    pub fn update_parameters(
        &self,
        tenant_id: &TenantId,
        params: ScoringParameters,
        as_of: DateTime<Utc>,
    ) -> Result<RescoreSummary, ScoringServiceError> {
        self.profiles
            .save_parameters(tenant_id, params)
            .map_err(ScoringServiceError::Profile)?;
        info!(%tenant_id, "scoring parameters updated");

        self.rescore_tenant(tenant_id, as_of)
    }

    /// Recompute and persist scores for all of a tenant's leads.
    ///
    /// Any read failure aborts the batch before further scores are computed; write failures
    /// are collected in the summary.
    pub fn rescore_tenant(
        &self,
        tenant_id: &TenantId,
        as_of: DateTime<Utc>,
    ) -> Result<RescoreSummary, ScoringServiceError> {
        let params = self.parameters_for(tenant_id)?;
        let records = self
            .leads
            .for_tenant(tenant_id)
            .map_err(ScoringServiceError::Fetch)?;

        let mut batch = Vec::with_capacity(records.len());
        for record in records {
            let interactions = self
                .interactions
                .for_lead(&record.lead.id)
                .map_err(ScoringServiceError::Fetch)?;
            batch.push((record, interactions));
        }

        let unweighted_stages =
            params.unweighted_stages(batch.iter().map(|(record, _)| record.lead.status.as_str()));

        let mut summary = RescoreSummary {
            tenant_id: tenant_id.clone(),
            scored: 0,
            persist_failures: Vec::new(),
            unweighted_stages,
        };

        for (record, interactions) in batch {
            let result = compute_lead_score(&record.lead, &interactions, &params, as_of);
            summary.scored += 1;
            if self.persist_lead_score(&record.lead.id, &result).is_err() {
                summary.persist_failures.push(record.lead.id);
            }
        }

        if !summary.unweighted_stages.is_empty() {
            warn!(
                %tenant_id,
                stages = ?summary.unweighted_stages,
                "leads sit in stages without a configured weight"
            );
        }
        info!(
            %tenant_id,
            scored = summary.scored,
            persist_failures = summary.persist_failures.len(),
            "tenant rescored"
        );

        Ok(summary)
    }

    /// A tenant's leads ordered by total score, best first, unscored last.
    pub fn ranked_leads(
        &self,
        tenant_id: &TenantId,
        band: Option<ScoreBand>,
    ) -> Result<Vec<ScoredLeadView>, ScoringServiceError> {
        let mut records = self
            .leads
            .for_tenant(tenant_id)
            .map_err(ScoringServiceError::Fetch)?;

        if let Some(band) = band {
            records.retain(|record| record.band() == band);
        }

        records.sort_by(|a, b| {
            let a_total = a.scores.map(|scores| scores.total_score);
            let b_total = b.scores.map(|scores| scores.total_score);
            b_total
                .cmp(&a_total)
                .then_with(|| a.lead.id.cmp(&b.lead.id))
        });

        Ok(records.iter().map(LeadRecord::scored_view).collect())
    }

    fn score_and_persist(
        &self,
        inputs: ScoringInputs,
        as_of: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoringServiceError> {
        let lead_id = &inputs.record.lead.id;
        let result = compute_lead_score(
            &inputs.record.lead,
            &inputs.interactions,
            &inputs.params,
            as_of,
        );
        self.persist_lead_score(lead_id, &result)?;
        info!(
            %lead_id,
            total_score = result.total_score,
            band = result.band().label(),
            "lead rescored"
        );
        Ok(result)
    }

    fn load_inputs(&self, lead_id: &LeadId) -> Result<ScoringInputs, ScoringServiceError> {
        let record = self
            .leads
            .fetch(lead_id)
            .map_err(ScoringServiceError::Fetch)?
            .ok_or_else(|| ScoringServiceError::LeadNotFound(lead_id.clone()))?;

        let interactions = self
            .interactions
            .for_lead(lead_id)
            .map_err(ScoringServiceError::Fetch)?;

        let params = self.parameters_for(&record.lead.tenant_id)?;

        Ok(ScoringInputs {
            record,
            interactions,
            params,
        })
    }

    fn parameters_for(
        &self,
        tenant_id: &TenantId,
    ) -> Result<ScoringParameters, ScoringServiceError> {
        self.profiles
            .parameters(tenant_id)
            .map_err(ScoringServiceError::Fetch)?
            .ok_or_else(|| ScoringServiceError::ParametersNotFound(tenant_id.clone()))
    }
}

/// Outcome of a tenant-wide recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RescoreSummary {
    pub tenant_id: TenantId,
    pub scored: usize,
    pub persist_failures: Vec<LeadId>,
    pub unweighted_stages: Vec<String>,
}

/// Error raised by the lead scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error("lead {0} not found")]
    LeadNotFound(LeadId),
    #[error("interaction {0} not found")]
    InteractionNotFound(InteractionId),
    #[error("no scoring parameters configured for tenant {0}")]
    ParametersNotFound(TenantId),
    #[error("failed to load scoring inputs: {0}")]
    Fetch(#[source] RepositoryError),
    #[error("failed to record interaction: {0}")]
    Interaction(#[source] RepositoryError),
    #[error("failed to save scoring parameters: {0}")]
    Profile(#[source] RepositoryError),
    #[error("scores computed but not saved: {source}")]
    Persist {
        result: ScoreResult,
        #[source]
        source: RepositoryError,
    },
}

impl ScoringServiceError {
    /// The computed scores, when the failure happened after computation.
    pub fn computed_result(&self) -> Option<&ScoreResult> {
        match self {
            ScoringServiceError::Persist { result, .. } => Some(result),
            _ => None,
        }
    }
}
