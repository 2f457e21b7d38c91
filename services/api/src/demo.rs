use crate::infra::{demo_seed, demo_tenant};
use chrono::{DateTime, Utc};
use clap::Args;
use leadflow::error::AppError;
use leadflow::scoring::{
    compute_lead_score, parse_as_of, Interaction, Lead, ScoreBand, ScoreResult, ScoredLeadView,
    ScoringParameters,
};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON document holding `lead`, `interactions`, and the tenant's `parameters`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Score as of this instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_as_of)]
    pub(crate) as_of: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Score as of this instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_as_of)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// Only list leads in this band (hot, warm, cold)
    #[arg(long, value_parser = parse_band)]
    pub(crate) band: Option<ScoreBand>,
}

#[derive(Debug, Deserialize)]
struct ScoreDocument {
    lead: Lead,
    #[serde(default)]
    interactions: Vec<Interaction>,
    parameters: ScoringParameters,
}

fn parse_band(raw: &str) -> Result<ScoreBand, String> {
    raw.parse()
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs { input, as_of } = args;
    let as_of = as_of.unwrap_or_else(Utc::now);

    let raw = std::fs::read_to_string(&input)?;
    let document: ScoreDocument = serde_json::from_str(&raw)?;
    let params = &document.parameters;

    let scores = compute_lead_score(&document.lead, &document.interactions, params, as_of);

    println!("Lead score for {} as of {}", document.lead.id, as_of.to_rfc3339());
    if params.stage_weight(&document.lead.status).is_none() {
        println!(
            "  note: stage '{}' has no configured weight",
            document.lead.status.trim()
        );
    }
    render_breakdown(&scores);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { as_of, band } = args;
    let as_of = as_of.unwrap_or_else(Utc::now);
    let today = as_of.date_naive();

    println!("Lead scoring demo ({})", today);
    let service = demo_seed(today, as_of).into_service()?;
    let tenant_id = demo_tenant();

    let summary = service.rescore_tenant(&tenant_id, as_of)?;
    println!(
        "Scored {} lead(s) for tenant '{}'",
        summary.scored, summary.tenant_id
    );
    if !summary.unweighted_stages.is_empty() {
        println!(
            "  stages without a weight (scored as 0): {}",
            summary.unweighted_stages.join(", ")
        );
    }

    let board = service.ranked_leads(&tenant_id, band)?;
    render_board(&board);
    Ok(())
}

fn render_breakdown(scores: &ScoreResult) {
    println!("  value          {:>2}/10", scores.value_score);
    println!("  engagement     {:>2}/10", scores.engagement_score);
    println!("  timeline       {:>2}/10", scores.timeline_score);
    println!("  qualification  {:>2}/10", scores.qualification_score);
    println!(
        "  total          {:>2}/10 ({})",
        scores.total_score,
        scores.band().label()
    );
}

fn render_board(board: &[ScoredLeadView]) {
    if board.is_empty() {
        println!("\nNo leads match the filter.");
        return;
    }

    println!("\n{:<4} {:<22} {:<12} {:>5}  band", "#", "lead", "stage", "score");
    for (rank, view) in board.iter().enumerate() {
        let total = view
            .total_score
            .map(|total| total.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<22} {:<12} {:>5}  {}",
            rank + 1,
            view.name,
            view.status,
            total,
            view.band
        );
    }
}
