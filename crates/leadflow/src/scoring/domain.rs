use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for pipeline leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for the account whose scoring profile governs a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionId(pub String);

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The slice of a CRM lead that scoring reads. Scoring never creates or deletes leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub tenant_id: TenantId,
    #[serde(default)]
    pub name: String,
    pub projected_value: f64,
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
    /// Free-text pipeline stage label defined by the tenant.
    pub status: String,
}

/// Channel of a recorded contact. Informational only; scoring ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionKind {
    Meeting,
    Call,
    Text,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    /// Engagement weight of an interaction. Negative contacts are excluded entirely.
    pub const fn weight(self) -> Option<f64> {
        match self {
            Sentiment::Positive => Some(1.0),
            Sentiment::Neutral => Some(0.5),
            Sentiment::Negative => None,
        }
    }
}

/// Immutable record of a contact with a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub lead_id: LeadId,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

/// Partial correction to a stored interaction; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InteractionEdit {
    #[serde(default, rename = "type")]
    pub kind: Option<InteractionKind>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl InteractionEdit {
    pub fn apply(&self, interaction: &mut Interaction) {
        if let Some(kind) = self.kind {
            interaction.kind = kind;
        }
        if let Some(sentiment) = self.sentiment {
            interaction.sentiment = sentiment;
        }
        if let Some(created_at) = self.created_at {
            interaction.created_at = created_at;
        }
    }
}

/// Freshly computed sub-scores and total for one lead, each on a 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub value_score: u8,
    pub engagement_score: u8,
    pub timeline_score: u8,
    pub qualification_score: u8,
    pub total_score: u8,
}

impl ScoreResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_total(self.total_score)
    }
}

/// Color-coding tier for a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Hot,
    Warm,
    Cold,
}

impl ScoreBand {
    pub const fn from_total(total: u8) -> Self {
        if total >= 8 {
            ScoreBand::Hot
        } else if total >= 5 {
            ScoreBand::Warm
        } else {
            ScoreBand::Cold
        }
    }

    /// Band of a lead that may not have been scored yet; unscored leads are cold.
    pub fn of(scores: Option<&ScoreResult>) -> Self {
        scores.map(ScoreResult::band).unwrap_or(ScoreBand::Cold)
    }

    pub const fn label(self) -> &'static str {
        match self {
            ScoreBand::Hot => "hot",
            ScoreBand::Warm => "warm",
            ScoreBand::Cold => "cold",
        }
    }
}

impl std::str::FromStr for ScoreBand {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(ScoreBand::Hot),
            "warm" => Ok(ScoreBand::Warm),
            "cold" => Ok(ScoreBand::Cold),
            other => Err(format!("unknown score band '{other}'")),
        }
    }
}

/// Parse an as-of instant given either as RFC 3339 or as a `YYYY-MM-DD` date (midnight UTC).
pub fn parse_as_of(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_thresholds_match_board_colors() {
        assert_eq!(ScoreBand::from_total(10), ScoreBand::Hot);
        assert_eq!(ScoreBand::from_total(8), ScoreBand::Hot);
        assert_eq!(ScoreBand::from_total(7), ScoreBand::Warm);
        assert_eq!(ScoreBand::from_total(5), ScoreBand::Warm);
        assert_eq!(ScoreBand::from_total(4), ScoreBand::Cold);
        assert_eq!(ScoreBand::from_total(0), ScoreBand::Cold);
        assert_eq!(ScoreBand::of(None), ScoreBand::Cold);
    }

    #[test]
    fn negative_sentiment_carries_no_weight() {
        assert_eq!(Sentiment::Positive.weight(), Some(1.0));
        assert_eq!(Sentiment::Neutral.weight(), Some(0.5));
        assert_eq!(Sentiment::Negative.weight(), None);
    }

    #[test]
    fn interaction_edit_only_touches_supplied_fields() {
        let logged_at = parse_as_of("2025-06-10T09:30:00Z").expect("timestamp parses");
        let mut interaction = Interaction {
            id: InteractionId("int-7".to_string()),
            lead_id: LeadId("lead-1".to_string()),
            kind: InteractionKind::Call,
            sentiment: Sentiment::Negative,
            created_at: logged_at,
        };

        let edit: InteractionEdit =
            serde_json::from_str(r#"{ "sentiment": "Positive" }"#).expect("edit parses");
        edit.apply(&mut interaction);

        assert_eq!(interaction.sentiment, Sentiment::Positive);
        assert_eq!(interaction.kind, InteractionKind::Call);
        assert_eq!(interaction.created_at, logged_at);
    }

    #[test]
    fn interaction_uses_type_field_on_the_wire() {
        let raw = r#"{
            "id": "int-1",
            "lead_id": "lead-1",
            "type": "Call",
            "sentiment": "Neutral",
            "created_at": "2025-03-01T15:00:00Z"
        }"#;
        let interaction: Interaction = serde_json::from_str(raw).expect("interaction parses");
        assert_eq!(interaction.kind, InteractionKind::Call);
        assert_eq!(interaction.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn as_of_accepts_dates_and_timestamps() {
        let from_date = parse_as_of("2025-06-15").expect("date parses");
        assert_eq!(from_date.to_rfc3339(), "2025-06-15T00:00:00+00:00");

        let from_stamp = parse_as_of("2025-06-15T09:30:00-05:00").expect("timestamp parses");
        assert_eq!(from_stamp.to_rfc3339(), "2025-06-15T14:30:00+00:00");

        assert!(parse_as_of("next tuesday").is_err());
    }

    #[test]
    fn parses_band_filters_case_insensitively() {
        assert_eq!(" Hot ".parse::<ScoreBand>(), Ok(ScoreBand::Hot));
        assert!("lukewarm".parse::<ScoreBand>().is_err());
    }
}
