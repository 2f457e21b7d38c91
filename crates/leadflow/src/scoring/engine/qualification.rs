use super::to_score;
use crate::scoring::params::ScoringParameters;

/// Stage weight for the lead's status, clamped to 0-10. `None` when the stage is unweighted.
pub(crate) fn score(status: &str, params: &ScoringParameters) -> Option<u8> {
    params.stage_weight(status).map(to_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_stage_labels_case_insensitively() {
        let params = ScoringParameters::default();
        assert_eq!(score("Won", &params), Some(10));
        assert_eq!(score(" negotiation ", &params), Some(8));
        assert_eq!(score("LOST", &params), Some(0));
    }

    #[test]
    fn unknown_stage_has_no_score() {
        let params = ScoringParameters::default();
        assert_eq!(score("nonexistent-stage", &params), None);
    }

    #[test]
    fn out_of_range_weights_are_clamped() {
        let mut params = ScoringParameters::default();
        params
            .qualification
            .stage_weights
            .insert("enterprise".to_string(), 14.0);
        params
            .qualification
            .stage_weights
            .insert("blocked".to_string(), -2.0);
        assert_eq!(score("enterprise", &params), Some(10));
        assert_eq!(score("blocked", &params), Some(0));
    }
}
