use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    parse_as_of, Interaction, InteractionEdit, InteractionId, InteractionKind, Lead, LeadId,
    ScoreBand, ScoreResult, Sentiment, TenantId,
};
use super::engine::compute_lead_score;
use super::params::ScoringParameters;
use super::repository::{InteractionRepository, LeadRepository, ScoringProfileRepository};
use super::service::{LeadScoringService, ScoringServiceError};

static INTERACTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_interaction_id() -> InteractionId {
    let id = INTERACTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InteractionId(format!("int-{id:06}"))
}

/// Router builder exposing lead scoring over HTTP.
pub fn scoring_router<L, I, P>(service: Arc<LeadScoringService<L, I, P>>) -> Router
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    Router::new()
        .route("/api/v1/scoring/compute", post(compute_handler))
        .route(
            "/api/v1/leads/:lead_id/score",
            get(preview_handler::<L, I, P>).post(rescore_handler::<L, I, P>),
        )
        .route(
            "/api/v1/leads/:lead_id/interactions",
            post(interaction_handler::<L, I, P>),
        )
        .route(
            "/api/v1/leads/:lead_id/interactions/:interaction_id",
            patch(edit_interaction_handler::<L, I, P>)
                .delete(delete_interaction_handler::<L, I, P>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/leads",
            get(ranking_handler::<L, I, P>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/scoring-parameters",
            put(parameters_handler::<L, I, P>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    #[serde(default)]
    pub band: Option<String>,
}

/// Stateless scoring request: everything the engine needs travels in the body.
///
/// `parameters` is mandatory; an absent profile is answered with 400 rather than stock weights.
#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    pub lead: Lead,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub parameters: Option<ScoringParameters>,
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewInteraction {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResponse {
    pub lead_id: LeadId,
    pub as_of: DateTime<Utc>,
    pub band: &'static str,
    pub scores: ScoreResult,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ScoreResponse {
    fn new(lead_id: LeadId, as_of: DateTime<Utc>, scores: ScoreResult, persisted: bool) -> Self {
        Self {
            lead_id,
            as_of,
            band: scores.band().label(),
            scores,
            persisted,
            warning: None,
        }
    }
}

pub(crate) async fn compute_handler(Json(request): Json<ComputeRequest>) -> Response {
    let as_of = match resolve_as_of(request.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(response) => return response,
    };
    let Some(params) = request.parameters else {
        return bad_request("scoring parameters are required".to_string());
    };
    let scores = compute_lead_score(&request.lead, &request.interactions, &params, as_of);

    let body = ScoreResponse::new(request.lead.id, as_of, scores, false);
    (StatusCode::OK, Json(body)).into_response()
}

pub(crate) async fn preview_handler<L, I, P>(
    State(service): State<Arc<LeadScoringService<L, I, P>>>,
    Path(lead_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    let as_of = match resolve_as_of(query.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(response) => return response,
    };
    let lead_id = LeadId(lead_id);

    match service.preview(&lead_id, as_of) {
        Ok(scores) => {
            let body = ScoreResponse::new(lead_id, as_of, scores, false);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(lead_id, as_of, error, StatusCode::OK),
    }
}

pub(crate) async fn rescore_handler<L, I, P>(
    State(service): State<Arc<LeadScoringService<L, I, P>>>,
    Path(lead_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    let as_of = match resolve_as_of(query.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(response) => return response,
    };
    let lead_id = LeadId(lead_id);

    match service.rescore(&lead_id, as_of) {
        Ok(scores) => {
            let body = ScoreResponse::new(lead_id, as_of, scores, true);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(lead_id, as_of, error, StatusCode::OK),
    }
}

pub(crate) async fn interaction_handler<L, I, P>(
    State(service): State<Arc<LeadScoringService<L, I, P>>>,
    Path(lead_id): Path<String>,
    Query(query): Query<AsOfQuery>,
    Json(payload): Json<NewInteraction>,
) -> Response
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    let as_of = match resolve_as_of(query.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(response) => return response,
    };
    let lead_id = LeadId(lead_id);
    let interaction = Interaction {
        id: next_interaction_id(),
        lead_id: lead_id.clone(),
        kind: payload.kind,
        sentiment: payload.sentiment,
        created_at: payload.created_at.unwrap_or(as_of),
    };

    match service.record_interaction(interaction, as_of) {
        Ok(scores) => {
            let body = ScoreResponse::new(lead_id, as_of, scores, true);
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(error) => error_response(lead_id, as_of, error, StatusCode::CREATED),
    }
}

pub(crate) async fn edit_interaction_handler<L, I, P>(
    State(service): State<Arc<LeadScoringService<L, I, P>>>,
    Path((lead_id, interaction_id)): Path<(String, String)>,
    Query(query): Query<AsOfQuery>,
    Json(edit): Json<InteractionEdit>,
) -> Response
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    let as_of = match resolve_as_of(query.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(response) => return response,
    };
    let lead_id = LeadId(lead_id);
    let interaction_id = InteractionId(interaction_id);

    match service.edit_interaction(&lead_id, &interaction_id, &edit, as_of) {
        Ok(scores) => {
            let body = ScoreResponse::new(lead_id, as_of, scores, true);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(lead_id, as_of, error, StatusCode::OK),
    }
}

pub(crate) async fn delete_interaction_handler<L, I, P>(
    State(service): State<Arc<LeadScoringService<L, I, P>>>,
    Path((lead_id, interaction_id)): Path<(String, String)>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    let as_of = match resolve_as_of(query.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(response) => return response,
    };
    let lead_id = LeadId(lead_id);
    let interaction_id = InteractionId(interaction_id);

    match service.delete_interaction(&lead_id, &interaction_id, as_of) {
        Ok(scores) => {
            let body = ScoreResponse::new(lead_id, as_of, scores, true);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => error_response(lead_id, as_of, error, StatusCode::OK),
    }
}

pub(crate) async fn ranking_handler<L, I, P>(
    State(service): State<Arc<LeadScoringService<L, I, P>>>,
    Path(tenant_id): Path<String>,
    Query(query): Query<RankingQuery>,
) -> Response
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    let band = match query.band.as_deref().map(str::parse::<ScoreBand>).transpose() {
        Ok(band) => band,
        Err(message) => return bad_request(message),
    };
    let tenant_id = TenantId(tenant_id);

    match service.ranked_leads(&tenant_id, band) {
        Ok(leads) => {
            let payload = json!({
                "tenant_id": tenant_id,
                "leads": leads,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => failure_response(&error),
    }
}

pub(crate) async fn parameters_handler<L, I, P>(
    State(service): State<Arc<LeadScoringService<L, I, P>>>,
    Path(tenant_id): Path<String>,
    Query(query): Query<AsOfQuery>,
    Json(params): Json<ScoringParameters>,
) -> Response
where
    L: LeadRepository + 'static,
    I: InteractionRepository + 'static,
    P: ScoringProfileRepository + 'static,
{
    let as_of = match resolve_as_of(query.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(response) => return response,
    };
    let tenant_id = TenantId(tenant_id);

    match service.update_parameters(&tenant_id, params, as_of) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => failure_response(&error),
    }
}

fn resolve_as_of(raw: Option<&str>) -> Result<DateTime<Utc>, Response> {
    match raw {
        Some(raw) => parse_as_of(raw).map_err(bad_request),
        None => Ok(Utc::now()),
    }
}

/// A failed score write still answers `success`, with the computed scores flagged as unsaved.
fn error_response(
    lead_id: LeadId,
    as_of: DateTime<Utc>,
    error: ScoringServiceError,
    success: StatusCode,
) -> Response {
    if let Some(scores) = error.computed_result().copied() {
        let mut body = ScoreResponse::new(lead_id, as_of, scores, false);
        body.warning = Some(error.to_string());
        return (success, Json(body)).into_response();
    }
    failure_response(&error)
}

fn failure_response(error: &ScoringServiceError) -> Response {
    let status = match error {
        ScoringServiceError::LeadNotFound(_)
        | ScoringServiceError::InteractionNotFound(_)
        | ScoringServiceError::ParametersNotFound(_) => StatusCode::NOT_FOUND,
        ScoringServiceError::Fetch(_)
        | ScoringServiceError::Interaction(_)
        | ScoringServiceError::Profile(_)
        | ScoringServiceError::Persist { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn bad_request(message: String) -> Response {
    let payload = json!({
        "error": message,
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}
