//! Pure scoring rules: levels, streaks, daily targets. No I/O and no clock;
//! callers pass "today" in explicitly.

use chrono::NaiveDate;

use crate::models::activity::ActivityKind;

/// Points needed to advance one level.
pub const POINTS_PER_LEVEL: i64 = 100;

/// Daily point total at which the client gets a celebration signal.
pub const CELEBRATION_THRESHOLD: i32 = 5;

pub fn level_for(total_points: i64) -> i32 {
    let total = total_points.max(0);
    (total / POINTS_PER_LEVEL) as i32 + 1
}

/// Fraction of the way from the current level to the next, in [0, 1).
pub fn level_progress(total_points: i64) -> f64 {
    let total = total_points.max(0);
    (total % POINTS_PER_LEVEL) as f64 / POINTS_PER_LEVEL as f64
}

pub fn points_to_next_level(total_points: i64) -> i64 {
    let total = total_points.max(0);
    POINTS_PER_LEVEL - (total % POINTS_PER_LEVEL)
}

/// Highest total reachable in one day under the given mode.
pub fn max_daily_points(emergency_mode: bool) -> i32 {
    ActivityKind::ALL
        .iter()
        .map(|k| k.points(emergency_mode))
        .sum()
}

/// Consecutive qualifying days ending today, scanned backward.
///
/// `scoring_dates` must hold the dates of entries worth at least one point,
/// newest first. Position `i` must sit exactly `i` days before today to keep
/// the run alive; the first gap ends it. A day without points today therefore
/// yields 0 regardless of yesterday.
pub fn streak_len(today: NaiveDate, scoring_dates: &[NaiveDate]) -> u32 {
    let mut streak = 0;
    for (i, date) in scoring_dates.iter().enumerate() {
        let days_diff = (today - *date).num_days();
        if days_diff == i as i64 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(250), 3);
    }

    #[test]
    fn level_is_monotonic() {
        let mut prev = level_for(0);
        for total in 0..=500 {
            let level = level_for(total);
            assert!(level >= prev);
            prev = level;
        }
    }

    #[test]
    fn progress_and_remainder() {
        assert_eq!(level_progress(0), 0.0);
        assert_eq!(level_progress(50), 0.5);
        assert_eq!(level_progress(100), 0.0);
        assert_eq!(points_to_next_level(0), 100);
        assert_eq!(points_to_next_level(99), 1);
        assert_eq!(points_to_next_level(100), 100);
    }

    #[test]
    fn point_schedule_is_fixed() {
        assert_eq!(ActivityKind::WeighIn.points(false), 1);
        assert_eq!(ActivityKind::WeighIn.points(true), 1);
        assert_eq!(ActivityKind::Exercise.points(false), 2);
        assert_eq!(ActivityKind::Exercise.points(true), 1);
        assert_eq!(ActivityKind::HealthyMeal.points(false), 1);
        assert_eq!(ActivityKind::HealthyMeal.points(true), 1);
        assert_eq!(ActivityKind::Water.points(false), 1);
        assert_eq!(ActivityKind::Water.points(true), 1);
    }

    #[test]
    fn daily_maximum_drops_in_emergency_mode() {
        assert_eq!(max_daily_points(false), 5);
        assert_eq!(max_daily_points(true), 4);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let today = d("2024-03-10");
        let dates = [today, today - Duration::days(1), today - Duration::days(2)];
        assert_eq!(streak_len(today, &dates), 3);
    }

    #[test]
    fn streak_today_only() {
        let today = d("2024-03-10");
        assert_eq!(streak_len(today, &[today]), 1);
    }

    #[test]
    fn streak_broken_when_today_missing() {
        let today = d("2024-03-10");
        let dates = [today - Duration::days(1), today - Duration::days(2)];
        assert_eq!(streak_len(today, &dates), 0);
    }

    #[test]
    fn streak_stops_at_gap() {
        let today = d("2024-03-10");
        let dates = [
            today,
            today - Duration::days(1),
            // two-day gap
            today - Duration::days(4),
            today - Duration::days(5),
        ];
        assert_eq!(streak_len(today, &dates), 2);
    }

    #[test]
    fn streak_empty_is_zero() {
        assert_eq!(streak_len(d("2024-03-10"), &[]), 0);
    }
}
