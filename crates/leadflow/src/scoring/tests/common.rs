use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::scoring::domain::{
    Interaction, InteractionId, InteractionKind, Lead, LeadId, ScoreResult, Sentiment, TenantId,
};
use crate::scoring::params::ScoringParameters;
use crate::scoring::repository::{
    InteractionRepository, LeadRecord, LeadRepository, RepositoryError, ScoringProfileRepository,
};
use crate::scoring::{scoring_router, LeadScoringService};

pub(super) fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn today() -> NaiveDate {
    as_of().date_naive()
}

pub(super) fn tenant() -> TenantId {
    TenantId("acme-hvac".to_string())
}

pub(super) fn lead(id: &str, projected_value: f64, status: &str) -> Lead {
    Lead {
        id: LeadId(id.to_string()),
        tenant_id: tenant(),
        name: format!("Lead {id}"),
        projected_value,
        follow_up_date: None,
        status: status.to_string(),
    }
}

pub(super) fn interaction(lead_id: &str, days_ago: i64, sentiment: Sentiment) -> Interaction {
    Interaction {
        id: InteractionId(format!("{lead_id}-int-{days_ago}")),
        lead_id: LeadId(lead_id.to_string()),
        kind: InteractionKind::Meeting,
        sentiment,
        created_at: as_of() - Duration::days(days_ago),
    }
}

/// Scenario lead worth 15000, follow-up 3 days overdue, stage "Won", no interactions.
pub(super) fn won_lead() -> Lead {
    let mut lead = lead("lead-won", 15000.0, "Won");
    lead.follow_up_date = Some(today() - Duration::days(3));
    lead
}

pub(super) fn scoring_parameters() -> ScoringParameters {
    ScoringParameters::default()
}

#[derive(Default)]
pub(super) struct MemoryLeads {
    records: Mutex<HashMap<LeadId, LeadRecord>>,
}

impl MemoryLeads {
    pub(super) fn with(leads: Vec<Lead>) -> Self {
        let store = Self::default();
        {
            let mut records = store.records.lock().expect("lead mutex poisoned");
            for lead in leads {
                records.insert(lead.id.clone(), LeadRecord::unscored(lead));
            }
        }
        store
    }

    pub(super) fn scores(&self, id: &str) -> Option<ScoreResult> {
        self.records
            .lock()
            .expect("lead mutex poisoned")
            .get(&LeadId(id.to_string()))
            .and_then(|record| record.scores)
    }
}

impl LeadRepository for MemoryLeads {
    fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("lead mutex poisoned")
            .get(id)
            .cloned())
    }

    fn for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<LeadRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("lead mutex poisoned")
            .values()
            .filter(|record| &record.lead.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn update_scores(&self, id: &LeadId, scores: &ScoreResult) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("lead mutex poisoned");
        let record = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.scores = Some(*scores);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryInteractions {
    events: Mutex<Vec<Interaction>>,
}

impl MemoryInteractions {
    pub(super) fn with(events: Vec<Interaction>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.events.lock().expect("interaction mutex poisoned").len()
    }
}

impl InteractionRepository for MemoryInteractions {
    fn for_lead(&self, lead_id: &LeadId) -> Result<Vec<Interaction>, RepositoryError> {
        Ok(self
            .events
            .lock()
            .expect("interaction mutex poisoned")
            .iter()
            .filter(|event| &event.lead_id == lead_id)
            .cloned()
            .collect())
    }

    fn insert(&self, interaction: Interaction) -> Result<(), RepositoryError> {
        self.events
            .lock()
            .expect("interaction mutex poisoned")
            .push(interaction);
        Ok(())
    }

    fn update(&self, interaction: Interaction) -> Result<(), RepositoryError> {
        let mut events = self.events.lock().expect("interaction mutex poisoned");
        let slot = events
            .iter_mut()
            .find(|event| event.id == interaction.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = interaction;
        Ok(())
    }

    fn remove(&self, id: &InteractionId) -> Result<(), RepositoryError> {
        let mut events = self.events.lock().expect("interaction mutex poisoned");
        let position = events
            .iter()
            .position(|event| &event.id == id)
            .ok_or(RepositoryError::NotFound)?;
        events.remove(position);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryProfiles {
    profiles: Mutex<HashMap<TenantId, ScoringParameters>>,
}

impl MemoryProfiles {
    pub(super) fn with(tenant_id: TenantId, params: ScoringParameters) -> Self {
        let store = Self::default();
        store
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(tenant_id, params);
        store
    }
}

impl ScoringProfileRepository for MemoryProfiles {
    fn parameters(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<ScoringParameters>, RepositoryError> {
        Ok(self
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(tenant_id)
            .cloned())
    }

    fn save_parameters(
        &self,
        tenant_id: &TenantId,
        params: ScoringParameters,
    ) -> Result<(), RepositoryError> {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(tenant_id.clone(), params);
        Ok(())
    }
}

/// Lead store that serves reads but rejects every score write.
pub(super) struct ReadOnlyLeads {
    inner: MemoryLeads,
}

impl ReadOnlyLeads {
    pub(super) fn with(leads: Vec<Lead>) -> Self {
        Self {
            inner: MemoryLeads::with(leads),
        }
    }
}

impl LeadRepository for ReadOnlyLeads {
    fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<LeadRecord>, RepositoryError> {
        self.inner.for_tenant(tenant_id)
    }

    fn update_scores(&self, _id: &LeadId, _scores: &ScoreResult) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only replica".to_string()))
    }
}

pub(super) struct UnavailableInteractions;

impl InteractionRepository for UnavailableInteractions {
    fn for_lead(&self, _lead_id: &LeadId) -> Result<Vec<Interaction>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _interaction: Interaction) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _interaction: Interaction) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &InteractionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type MemoryService = LeadScoringService<MemoryLeads, MemoryInteractions, MemoryProfiles>;

pub(super) struct Harness {
    pub(super) service: MemoryService,
    pub(super) leads: Arc<MemoryLeads>,
    pub(super) interactions: Arc<MemoryInteractions>,
}

/// Service over a seeded tenant with three leads spread across the bands.
pub(super) fn build_service() -> Harness {
    let mut hot = lead("lead-hot", 12000.0, "Negotiation");
    hot.follow_up_date = Some(today() + Duration::days(2));
    let warm = lead("lead-warm", 6000.0, "Contacted");
    let cold = lead("lead-cold", 200.0, "New");

    let leads = Arc::new(MemoryLeads::with(vec![hot, warm, cold]));
    let interactions = Arc::new(MemoryInteractions::with(vec![
        interaction("lead-hot", 1, Sentiment::Positive),
        interaction("lead-hot", 4, Sentiment::Positive),
        interaction("lead-hot", 9, Sentiment::Positive),
        interaction("lead-warm", 5, Sentiment::Neutral),
        interaction("lead-cold", 2, Sentiment::Negative),
    ]));
    let profiles = Arc::new(MemoryProfiles::with(tenant(), scoring_parameters()));

    Harness {
        service: LeadScoringService::new(leads.clone(), interactions.clone(), profiles),
        leads,
        interactions,
    }
}

pub(super) fn router_for(service: MemoryService) -> axum::Router {
    scoring_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
