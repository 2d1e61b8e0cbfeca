//! Goal progress: cumulative best within a calendar year, rescaled between a
//! pre-year baseline (0) and a target (1).

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::warn;

use crate::extremum::cumulative_max;
use crate::records::{GoalTargets, LiftRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgressRow {
    pub exercise_name: String,
    pub date: NaiveDate,
    pub one_rep_max: f64,
    pub cummax_one_rep_max: f64,
    pub baseline: f64,
    pub target: f64,
    pub progress: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GoalProgress {
    pub rows: Vec<GoalProgressRow>,
    /// Exercises with a target but nothing recorded in the baseline window,
    /// or whose target does not exceed the baseline.
    pub excluded: Vec<String>,
}

/// Best 1RM of `exercise` dated in `[year_start - lookback_days, year_start)`.
pub fn baseline<L: AsRef<LiftRecord>>(
    lifts: &[L],
    exercise: &str,
    year_start: NaiveDate,
    lookback_days: i64,
) -> Option<f64> {
    let window_start = year_start - Duration::days(lookback_days);
    lifts
        .iter()
        .map(AsRef::<LiftRecord>::as_ref)
        .filter(|l| l.exercise_name == exercise && !l.one_rep_max.is_nan())
        .filter(|l| l.date >= window_start && l.date < year_start)
        .map(|l| l.one_rep_max)
        .reduce(f64::max)
}

/// `(best_to_date - baseline) / (target - baseline)`; exactly 0 while the
/// baseline has not been beaten.
pub fn normalize(best_to_date: f64, baseline: f64, target: f64) -> f64 {
    if best_to_date <= baseline {
        0.0
    } else {
        (best_to_date - baseline) / (target - baseline)
    }
}

/// Progress series for every targeted exercise over calendar `year`.
///
/// Each series opens with a synthetic point at 1 January valued at the
/// baseline, followed by one point per training day (that day's best).
/// Exercises without a baseline, or already at or past their target before
/// the year starts, are reported in `excluded`, never zeroed.
pub fn goal_progress<L: AsRef<LiftRecord>>(
    lifts: &[L],
    targets: &GoalTargets,
    year: i32,
    lookback_days: i64,
) -> GoalProgress {
    let mut out = GoalProgress::default();
    let (Some(year_start), Some(year_end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year + 1, 1, 1),
    ) else {
        return out;
    };

    for (exercise, &target) in targets {
        let Some(base) = baseline(lifts, exercise, year_start, lookback_days) else {
            warn!(exercise = %exercise, year, "no lifts in baseline window, excluding from goal progress");
            out.excluded.push(exercise.clone());
            continue;
        };
        if target <= base {
            warn!(
                exercise = %exercise,
                year,
                target,
                baseline = base,
                "target not above baseline, excluding from goal progress"
            );
            out.excluded.push(exercise.clone());
            continue;
        }

        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for lift in lifts.iter().map(AsRef::<LiftRecord>::as_ref).filter(|l| {
            l.exercise_name == *exercise
                && !l.one_rep_max.is_nan()
                && l.date >= year_start
                && l.date < year_end
        }) {
            let best = daily.entry(lift.date).or_insert(f64::NAN);
            *best = best.max(lift.one_rep_max);
        }

        let points: Vec<(NaiveDate, f64)> = std::iter::once((year_start, base))
            .chain(daily)
            .collect();
        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
        let running = cumulative_max(&values);

        out.rows.extend(points.into_iter().zip(running).map(|((date, value), best)| {
            GoalProgressRow {
                exercise_name: exercise.clone(),
                date,
                one_rep_max: value,
                cummax_one_rep_max: best,
                baseline: base,
                target,
                progress: normalize(best, base, target),
            }
        }));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lift(name: &str, date: NaiveDate, orm: f64) -> LiftRecord {
        LiftRecord::new(name, date, 5, orm)
    }

    fn sample() -> Vec<LiftRecord> {
        vec![
            lift("Squat (Barbell)", date(2022, 11, 3), 250.0),
            lift("Squat (Barbell)", date(2022, 12, 20), 260.0),
            lift("Squat (Barbell)", date(2023, 1, 10), 255.0),
            lift("Squat (Barbell)", date(2023, 2, 1), 280.0),
            lift("Squat (Barbell)", date(2023, 2, 1), 270.0),
            lift("Squat (Barbell)", date(2023, 3, 15), 275.0),
            lift("Squat (Barbell)", date(2024, 1, 2), 400.0),
            lift("Deadlift (Barbell)", date(2023, 4, 1), 350.0),
        ]
    }

    fn targets() -> GoalTargets {
        GoalTargets::from([
            ("Squat (Barbell)".to_string(), 310.0),
            ("Deadlift (Barbell)".to_string(), 405.0),
        ])
    }

    #[test]
    fn series_starts_at_zero_on_new_year() {
        let progress = goal_progress(&sample(), &targets(), 2023, 365);
        let first = &progress.rows[0];
        assert_eq!(first.exercise_name, "Squat (Barbell)");
        assert_eq!(first.date, date(2023, 1, 1));
        assert_eq!(first.one_rep_max, 260.0);
        assert_eq!(first.progress, 0.0);
    }

    #[test]
    fn progress_is_monotone_and_scaled() {
        let progress = goal_progress(&sample(), &targets(), 2023, 365);
        let squat: Vec<&GoalProgressRow> = progress
            .rows
            .iter()
            .filter(|r| r.exercise_name == "Squat (Barbell)")
            .collect();
        // synthetic start + three training days, 2024 excluded
        assert_eq!(squat.len(), 4);
        assert_eq!(squat[1].progress, 0.0);
        assert!((squat[2].progress - 0.4).abs() < 1e-12);
        assert!((squat[3].progress - 0.4).abs() < 1e-12);
        assert!(squat.windows(2).all(|w| w[1].progress >= w[0].progress));
    }

    #[test]
    fn missing_baseline_excludes_the_exercise() {
        let progress = goal_progress(&sample(), &targets(), 2023, 365);
        assert_eq!(progress.excluded, vec!["Deadlift (Barbell)".to_string()]);
        assert!(progress
            .rows
            .iter()
            .all(|r| r.exercise_name != "Deadlift (Barbell)"));
    }

    #[test]
    fn targets_at_or_below_baseline_are_excluded() {
        let lowered = GoalTargets::from([("Squat (Barbell)".to_string(), 240.0)]);
        let progress = goal_progress(&sample(), &lowered, 2023, 365);
        assert!(progress.rows.is_empty());
        assert_eq!(progress.excluded, vec!["Squat (Barbell)".to_string()]);

        let reached = GoalTargets::from([("Squat (Barbell)".to_string(), 260.0)]);
        let progress = goal_progress(&sample(), &reached, 2023, 365);
        assert!(progress.rows.is_empty());
        assert_eq!(progress.excluded.len(), 1);
    }

    #[test]
    fn baseline_window_is_bounded() {
        let lifts = sample();
        let start = date(2023, 1, 1);
        assert_eq!(baseline(&lifts, "Squat (Barbell)", start, 365), Some(260.0));
        assert_eq!(baseline(&lifts, "Squat (Barbell)", start, 30), Some(260.0));
        assert_eq!(baseline(&lifts, "Squat (Barbell)", start, 10), None);
    }

    #[test]
    fn baseline_not_beaten_stays_at_zero() {
        assert_eq!(normalize(250.0, 260.0, 300.0), 0.0);
        assert_eq!(normalize(260.0, 260.0, 260.0), 0.0);
        assert!((normalize(280.0, 260.0, 300.0) - 0.5).abs() < 1e-12);
    }
}
