use serde::{Deserialize, Serialize};

use super::domain::{Interaction, InteractionId, Lead, LeadId, ScoreBand, ScoreResult, TenantId};
use super::params::ScoringParameters;

/// Lead as held by the lead store: CRM fields plus the last persisted scores, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub lead: Lead,
    #[serde(default)]
    pub scores: Option<ScoreResult>,
}

impl LeadRecord {
    pub fn unscored(lead: Lead) -> Self {
        Self { lead, scores: None }
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::of(self.scores.as_ref())
    }

    pub fn scored_view(&self) -> ScoredLeadView {
        ScoredLeadView {
            lead_id: self.lead.id.clone(),
            name: self.lead.name.clone(),
            status: self.lead.status.clone(),
            band: self.band().label(),
            total_score: self.scores.map(|scores| scores.total_score),
            scores: self.scores,
        }
    }
}

/// Lead store contract. `update_scores` overwrites the five score fields, last write wins.
pub trait LeadRepository: Send + Sync {
    fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError>;
    fn for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<LeadRecord>, RepositoryError>;
    fn update_scores(&self, id: &LeadId, scores: &ScoreResult) -> Result<(), RepositoryError>;
}

/// Interaction store contract. `update` and `remove` answer `NotFound` for unknown ids.
pub trait InteractionRepository: Send + Sync {
    fn for_lead(&self, lead_id: &LeadId) -> Result<Vec<Interaction>, RepositoryError>;
    fn insert(&self, interaction: Interaction) -> Result<(), RepositoryError>;
    fn update(&self, interaction: Interaction) -> Result<(), RepositoryError>;
    fn remove(&self, id: &InteractionId) -> Result<(), RepositoryError>;
}

/// Profile store contract supplying one parameter set per tenant.
pub trait ScoringProfileRepository: Send + Sync {
    fn parameters(&self, tenant_id: &TenantId)
        -> Result<Option<ScoringParameters>, RepositoryError>;
    fn save_parameters(
        &self,
        tenant_id: &TenantId,
        params: ScoringParameters,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Display projection used by the pipeline board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLeadView {
    pub lead_id: LeadId,
    pub name: String,
    pub status: String,
    pub band: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreResult>,
}
