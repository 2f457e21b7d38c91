use chrono::NaiveDate;

use super::to_score;
use crate::scoring::params::TimelineTuning;

const NEUTRAL: u8 = 5;
const SWEET_SPOT: u8 = 10;

/// Urgency of the next scheduled follow-up.
///
/// Peaks at 10 for follow-ups due within `[0, optimal_days_ahead]` days, decays by one point
/// per `overdue_penalty` days overdue (floor 0), and by one point per whole `upcoming_bonus`
/// days beyond the window (floor 5). No follow-up scores a neutral 5.
pub(crate) fn score(
    follow_up_date: Option<NaiveDate>,
    tuning: &TimelineTuning,
    today: NaiveDate,
) -> u8 {
    let Some(follow_up) = follow_up_date else {
        return NEUTRAL;
    };

    let days_until = (follow_up - today).num_days();

    if days_until < 0 {
        let overdue = days_until.unsigned_abs() as f64;
        let raw = if tuning.overdue_penalty > 0.0 {
            10.0 - overdue / tuning.overdue_penalty
        } else {
            0.0
        };
        return to_score(raw.max(0.0));
    }

    let days_until = days_until as f64;
    if days_until <= tuning.optimal_days_ahead {
        return SWEET_SPOT;
    }

    let beyond = days_until - tuning.optimal_days_ahead;
    let lost_points = if tuning.upcoming_bonus > 0.0 {
        (beyond / tuning.upcoming_bonus).floor()
    } else {
        f64::INFINITY
    };

    to_score((10.0 - lost_points).max(f64::from(NEUTRAL)))
}
