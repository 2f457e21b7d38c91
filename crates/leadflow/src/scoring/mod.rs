//! Lead scoring: a deterministic 0-10 priority score per lead built from projected value,
//! interaction history, follow-up urgency, and pipeline stage, tuned per tenant.

pub mod domain;
pub mod engine;
pub mod params;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    parse_as_of, Interaction, InteractionEdit, InteractionId, InteractionKind, Lead, LeadId,
    ScoreBand, ScoreResult, Sentiment, TenantId,
};
pub use engine::{compute_lead_score, ScoringEngine};
pub use params::{
    EngagementTuning, QualificationWeights, ScoringParameters, TimelineTuning, ValueThresholds,
};
pub use repository::{
    InteractionRepository, LeadRecord, LeadRepository, RepositoryError, ScoredLeadView,
    ScoringProfileRepository,
};
pub use router::scoring_router;
pub use service::{LeadScoringService, RescoreSummary, ScoringServiceError};
