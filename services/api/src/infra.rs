use chrono::{DateTime, Duration, NaiveDate, Utc};
use leadflow::error::AppError;
use leadflow::scoring::{
    Interaction, InteractionId, InteractionKind, InteractionRepository, Lead,
    LeadId, LeadRecord, LeadRepository, LeadScoringService, RepositoryError, ScoreResult,
    ScoringParameters, ScoringProfileRepository, Sentiment, TenantId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLeadRepository {
    records: Arc<Mutex<HashMap<LeadId, LeadRecord>>>,
}

impl InMemoryLeadRepository {
    pub(crate) fn insert(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("lead mutex poisoned");
        if guard.contains_key(&lead.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(lead.id.clone(), LeadRecord::unscored(lead));
        Ok(())
    }
}

impl LeadRepository for InMemoryLeadRepository {
    fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        let guard = self.records.lock().expect("lead mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<LeadRecord>, RepositoryError> {
        let guard = self.records.lock().expect("lead mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.lead.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn update_scores(&self, id: &LeadId, scores: &ScoreResult) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("lead mutex poisoned");
        match guard.get_mut(id) {
            Some(record) => {
                record.scores = Some(*scores);
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryInteractionRepository {
    events: Arc<Mutex<Vec<Interaction>>>,
}

impl InteractionRepository for InMemoryInteractionRepository {
    fn for_lead(&self, lead_id: &LeadId) -> Result<Vec<Interaction>, RepositoryError> {
        let guard = self.events.lock().expect("interaction mutex poisoned");
        Ok(guard
            .iter()
            .filter(|event| &event.lead_id == lead_id)
            .cloned()
            .collect())
    }

    fn insert(&self, interaction: Interaction) -> Result<(), RepositoryError> {
        let mut guard = self.events.lock().expect("interaction mutex poisoned");
        if guard.iter().any(|event| event.id == interaction.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(interaction);
        Ok(())
    }

    fn update(&self, interaction: Interaction) -> Result<(), RepositoryError> {
        let mut guard = self.events.lock().expect("interaction mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|event| event.id == interaction.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = interaction;
        Ok(())
    }

    fn remove(&self, id: &InteractionId) -> Result<(), RepositoryError> {
        let mut guard = self.events.lock().expect("interaction mutex poisoned");
        let position = guard
            .iter()
            .position(|event| &event.id == id)
            .ok_or(RepositoryError::NotFound)?;
        guard.remove(position);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileRepository {
    profiles: Arc<Mutex<HashMap<TenantId, ScoringParameters>>>,
}

impl ScoringProfileRepository for InMemoryProfileRepository {
    fn parameters(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<ScoringParameters>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(tenant_id).cloned())
    }

    fn save_parameters(
        &self,
        tenant_id: &TenantId,
        params: ScoringParameters,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        guard.insert(tenant_id.clone(), params);
        Ok(())
    }
}

pub(crate) type InMemoryScoringService = LeadScoringService<
    InMemoryLeadRepository,
    InMemoryInteractionRepository,
    InMemoryProfileRepository,
>;

/// JSON document used to hydrate the in-memory stores.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PipelineSeed {
    #[serde(default)]
    pub(crate) tenants: Vec<TenantSeed>,
    #[serde(default)]
    pub(crate) leads: Vec<Lead>,
    #[serde(default)]
    pub(crate) interactions: Vec<Interaction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TenantSeed {
    pub(crate) tenant_id: TenantId,
    #[serde(default)]
    pub(crate) parameters: ScoringParameters,
}

impl PipelineSeed {
    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Build the stores and the service over them. Leads of tenants without a profile get
    /// the default parameters.
    pub(crate) fn into_service(self) -> Result<Arc<InMemoryScoringService>, AppError> {
        let leads = InMemoryLeadRepository::default();
        let interactions = InMemoryInteractionRepository::default();
        let profiles = InMemoryProfileRepository::default();

        for tenant in self.tenants {
            profiles
                .save_parameters(&tenant.tenant_id, tenant.parameters)
                .map_err(seed_error)?;
        }
        for lead in self.leads {
            if profiles
                .parameters(&lead.tenant_id)
                .map_err(seed_error)?
                .is_none()
            {
                profiles
                    .save_parameters(&lead.tenant_id, ScoringParameters::default())
                    .map_err(seed_error)?;
            }
            leads.insert(lead).map_err(seed_error)?;
        }
        for interaction in self.interactions {
            interactions.insert(interaction).map_err(seed_error)?;
        }

        Ok(Arc::new(LeadScoringService::new(
            Arc::new(leads),
            Arc::new(interactions),
            Arc::new(profiles),
        )))
    }
}

fn seed_error(error: RepositoryError) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid seed data: {error}"),
    ))
}

/// A small pipeline relative to `today` so demos show every band.
pub(crate) fn demo_seed(today: NaiveDate, as_of: DateTime<Utc>) -> PipelineSeed {
    let tenant_id = demo_tenant();
    let lead = |id: &str, name: &str, value: f64, follow_up: Option<i64>, status: &str| Lead {
        id: LeadId(id.to_string()),
        tenant_id: tenant_id.clone(),
        name: name.to_string(),
        projected_value: value,
        follow_up_date: follow_up.map(|days| today + Duration::days(days)),
        status: status.to_string(),
    };
    let contact = |id: &str, lead: &str, kind, sentiment, days_ago: i64| Interaction {
        id: InteractionId(id.to_string()),
        lead_id: LeadId(lead.to_string()),
        kind,
        sentiment,
        created_at: as_of - Duration::days(days_ago),
    };

    PipelineSeed {
        tenants: vec![TenantSeed {
            tenant_id: tenant_id.clone(),
            parameters: ScoringParameters::default(),
        }],
        leads: vec![
            lead("lead-001", "Harbor Dental", 14500.0, Some(2), "Negotiation"),
            lead("lead-002", "Maple Street HOA", 6200.0, Some(-4), "Qualified"),
            lead("lead-003", "Orchid Cafe", 2400.0, None, "Contacted"),
            lead("lead-004", "Ridgeview Storage", 800.0, Some(30), "New"),
            lead("lead-005", "Bluebird Daycare", 3100.0, Some(5), "Site Visit"),
        ],
        interactions: vec![
            contact("int-001", "lead-001", InteractionKind::Meeting, Sentiment::Positive, 1),
            contact("int-002", "lead-001", InteractionKind::Call, Sentiment::Positive, 5),
            contact("int-003", "lead-001", InteractionKind::Email, Sentiment::Neutral, 9),
            contact("int-004", "lead-002", InteractionKind::Call, Sentiment::Neutral, 6),
            contact("int-005", "lead-003", InteractionKind::Text, Sentiment::Negative, 2),
            contact("int-006", "lead-005", InteractionKind::Meeting, Sentiment::Positive, 12),
        ],
    }
}

pub(crate) fn demo_tenant() -> TenantId {
    TenantId("demo".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow::scoring::parse_as_of;

    #[test]
    fn seed_parses_and_defaults_missing_profiles() {
        let raw = r#"{
            "leads": [
                { "id": "lead-1", "tenant_id": "t-1", "projected_value": 5000, "status": "New" }
            ],
            "interactions": [
                {
                    "id": "int-1",
                    "lead_id": "lead-1",
                    "type": "Email",
                    "sentiment": "Positive",
                    "created_at": "2025-06-14T10:00:00Z"
                }
            ]
        }"#;
        let seed: PipelineSeed = serde_json::from_str(raw).expect("seed parses");
        let service = seed.into_service().expect("service builds");
        let as_of = parse_as_of("2025-06-15").expect("as_of parses");

        let scores = service
            .preview(&LeadId("lead-1".to_string()), as_of)
            .expect("lead scores with default profile");
        assert_eq!(scores.value_score, 7);
        assert_eq!(scores.qualification_score, 2);
    }

    #[test]
    fn duplicate_leads_are_rejected() {
        let repository = InMemoryLeadRepository::default();
        let lead = Lead {
            id: LeadId("lead-1".to_string()),
            tenant_id: TenantId("t-1".to_string()),
            name: String::new(),
            projected_value: 0.0,
            follow_up_date: None,
            status: "New".to_string(),
        };
        repository.insert(lead.clone()).expect("first insert");
        assert!(matches!(
            repository.insert(lead),
            Err(RepositoryError::Conflict)
        ));
    }
    #[test]
    fn interaction_store_updates_and_removes_by_id() {
        let repository = InMemoryInteractionRepository::default();
        let lead_id = LeadId("lead-1".to_string());
        let mut contact = Interaction {
            id: InteractionId("int-1".to_string()),
            lead_id: lead_id.clone(),
            kind: InteractionKind::Call,
            sentiment: Sentiment::Negative,
            created_at: parse_as_of("2025-06-14").expect("timestamp parses"),
        };
        repository.insert(contact.clone()).expect("insert");

        contact.sentiment = Sentiment::Positive;
        repository.update(contact.clone()).expect("update");
        assert_eq!(
            repository.for_lead(&lead_id).expect("read"),
            vec![contact.clone()]
        );

        repository.remove(&contact.id).expect("remove");
        assert!(repository.for_lead(&lead_id).expect("read").is_empty());
        assert_eq!(
            repository.remove(&contact.id),
            Err(RepositoryError::NotFound)
        );
        assert_eq!(repository.update(contact), Err(RepositoryError::NotFound));
    }
}
