use super::to_score;
use crate::scoring::domain::ScoreResult;

/// Package the four sub-scores with their rounded mean.
///
/// The total averages the already-rounded sub-scores so it always agrees with the values
/// shown next to it.
pub(crate) fn combine(
    value_score: u8,
    engagement_score: u8,
    timeline_score: u8,
    qualification_score: u8,
) -> ScoreResult {
    let sum = u16::from(value_score)
        + u16::from(engagement_score)
        + u16::from(timeline_score)
        + u16::from(qualification_score);

    ScoreResult {
        value_score,
        engagement_score,
        timeline_score,
        qualification_score,
        total_score: to_score(f64::from(sum) / 4.0),
    }
}
