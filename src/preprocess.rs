//! Derived columns normally produced by the offline preparation step.
//!
//! Used when the lift file arrives without `cummax_one_rep_max` /
//! `rolling_90d_max`, or when no volume file is present.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};

use crate::extremum::{cumulative_max, group_positions, trailing_window_max};
use crate::records::{LiftRecord, VolumeRecord};

/// Bar weight (lb) added to every `(Barbell)` set, which logs plates only.
pub const BARBELL_WEIGHT: f64 = 44.0;

/// Exercises whose load is the lifter's body mass rather than the logged
/// weight.
pub const BODY_MASS_EXERCISES: [&str; 15] = [
    "Chin Up",
    "Pull Up",
    "Wide Pull Up",
    "Back Extension",
    "Ab Coaster",
    "Battle Ropes",
    "Press Up",
    "Chest Dip",
    "Triceps Dip",
    "Curved Hack Squat",
    "Bulgarian Split Squat (Plate-Loaded)",
    "Knee Raise (Captain's Chair)",
    "Half-Hack Squat",
    "Goblet Squat (Kettlebell)",
    "Lunge (Dumbbell)",
];

/// Epley estimate: `load * (1 + reps / 30)`.
///
/// The load is `body_mass` for the exercises in [`BODY_MASS_EXERCISES`]
/// (falling back to the logged weight when no body mass is known), and the
/// logged weight plus [`BARBELL_WEIGHT`] for barbell exercises.
pub fn estimate_one_rep_max(
    exercise_name: &str,
    weight: f64,
    body_mass: Option<f64>,
    reps: u32,
) -> f64 {
    let load = match body_mass {
        Some(mass) if BODY_MASS_EXERCISES.contains(&exercise_name) => mass,
        _ if exercise_name.contains("(Barbell)") => weight + BARBELL_WEIGHT,
        _ => weight,
    };
    load * (1.0 + f64::from(reps) / 30.0)
}

/// Fills `cummax_one_rep_max` and `rolling_90d_max` on every row.
///
/// Both are computed per exercise over the daily best 1RM, then written
/// back to each row of that exercise and day.
pub fn with_derived_maxima(lifts: Vec<LiftRecord>, window_days: i64) -> Vec<LiftRecord> {
    let mut derived: HashMap<(String, NaiveDate), (f64, f64)> = HashMap::new();

    for (exercise, positions) in group_positions(lifts.iter().map(|l| l.exercise_name.as_str())) {
        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for &pos in &positions {
            let best = daily.entry(lifts[pos].date).or_insert(f64::NAN);
            *best = best.max(lifts[pos].one_rep_max);
        }

        let points: Vec<(NaiveDate, f64)> = daily.into_iter().collect();
        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
        let cummax = cumulative_max(&values);
        let rolling = trailing_window_max(&points, window_days);

        for (((date, _), cm), rm) in points.into_iter().zip(cummax).zip(rolling) {
            derived.insert((exercise.to_string(), date), (cm, rm));
        }
    }

    lifts
        .into_iter()
        .map(|mut lift| {
            if let Some(&(cm, rm)) = derived.get(&(lift.exercise_name.clone(), lift.date)) {
                lift.cummax_one_rep_max = cm;
                lift.rolling_90d_max = rm;
            }
            lift
        })
        .collect()
}

/// Daily volume: summed 1RM per date, every day between the first and last
/// training day present, rest days at zero.
pub fn derive_volume(lifts: &[LiftRecord]) -> Vec<VolumeRecord> {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for lift in lifts {
        let total = per_day.entry(lift.date).or_insert(0.0);
        if !lift.one_rep_max.is_nan() {
            *total += lift.one_rep_max;
        }
    }

    let (Some(&first), Some(&last)) = (per_day.keys().next(), per_day.keys().next_back()) else {
        return Vec::new();
    };

    let days = (last - first).num_days();
    (0..=days)
        .map(|offset| {
            let date = first + Duration::days(offset);
            VolumeRecord {
                date,
                one_rep_max: per_day.get(&date).copied().unwrap_or(0.0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn epley_estimate() {
        assert_eq!(estimate_one_rep_max("Row (Cable)", 150.0, None, 0), 150.0);
        let pulldown = estimate_one_rep_max("Lat Pulldown (Cable)", 225.0, Some(180.0), 5);
        assert!((pulldown - 262.5).abs() < 1e-9);
    }

    #[test]
    fn barbell_sets_include_the_bar() {
        // (181 + 44) * (1 + 5 / 30)
        for body_mass in [None, Some(170.0)] {
            let squat = estimate_one_rep_max("Squat (Barbell)", 181.0, body_mass, 5);
            assert!((squat - 262.5).abs() < 1e-9);
        }
    }

    #[test]
    fn bodyweight_exercises_use_body_mass() {
        assert!((estimate_one_rep_max("Pull Up", 0.0, Some(180.0), 6) - 216.0).abs() < 1e-9);
        // no body mass logged: the set weight stands in
        assert_eq!(estimate_one_rep_max("Pull Up", 25.0, None, 0), 25.0);
    }

    #[test]
    fn derived_maxima_use_daily_bests() {
        let lifts = vec![
            LiftRecord::new("Bench Press (Barbell)", day(0), 5, 200.0),
            LiftRecord::new("Bench Press (Barbell)", day(0), 3, 210.0),
            LiftRecord::new("Squat (Barbell)", day(1), 5, 300.0),
            LiftRecord::new("Bench Press (Barbell)", day(50), 5, 190.0),
            LiftRecord::new("Bench Press (Barbell)", day(100), 5, 180.0),
        ];
        let out = with_derived_maxima(lifts, 90);

        assert_eq!(out[0].cummax_one_rep_max, 210.0);
        assert_eq!(out[1].cummax_one_rep_max, 210.0);
        assert_eq!(out[0].rolling_90d_max, 210.0);
        assert_eq!(out[2].cummax_one_rep_max, 300.0);
        assert_eq!(out[3].rolling_90d_max, 210.0);
        // day 0 has fallen out of the 90-day window by day 100
        assert_eq!(out[4].rolling_90d_max, 190.0);
        assert_eq!(out[4].cummax_one_rep_max, 210.0);
    }

    #[test]
    fn volume_fills_rest_days() {
        let lifts = vec![
            LiftRecord::new("Row (Cable)", day(0), 8, 100.0),
            LiftRecord::new("Curl (Dumbbell)", day(0), 8, 40.0),
            LiftRecord::new("Row (Cable)", day(3), 8, 110.0),
        ];
        let volume = derive_volume(&lifts);
        let values: Vec<f64> = volume.iter().map(|v| v.one_rep_max).collect();
        assert_eq!(values, vec![140.0, 0.0, 0.0, 110.0]);
        assert_eq!(volume[3].date, day(3));
        assert!(derive_volume(&[]).is_empty());
    }
}
