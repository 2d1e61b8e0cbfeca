//! Trailing-window and cumulative maxima over per-group time series.
//!
//! Callers group and order; these functions see one group at a time as a
//! slice of `(date, value)` points and return one output per input point,
//! position for position.

use std::collections::HashMap;

use chrono::NaiveDate;

/// Row positions per group key, groups in order of first appearance.
pub fn group_positions<'a, I>(keys: I) -> Vec<(&'a str, Vec<usize>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Vec<usize>)> = Vec::new();
    for (pos, key) in keys.into_iter().enumerate() {
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(pos);
    }
    groups
}

/// Max over points dated in `(t - window_days, t]` for each point's date `t`.
///
/// Same-day points are all inside each other's window. NaN values never
/// win; a window holding only NaN yields NaN.
pub fn trailing_window_max(points: &[(NaiveDate, f64)], window_days: i64) -> Vec<f64> {
    points
        .iter()
        .map(|&(t, _)| {
            points
                .iter()
                .filter(|(d, v)| !v.is_nan() && in_trailing_window(*d, t, window_days))
                .map(|(_, v)| *v)
                .fold(f64::NAN, f64::max)
        })
        .collect()
}

/// Best-lift flags.
///
/// A point is a best lift when it equals the max of its own trailing
/// window and no point whose trailing window reaches back over it (dated
/// within `[t, t + window_days)`) is heavier. Ties are all flagged.
pub fn best_lift_flags(points: &[(NaiveDate, f64)], window_days: i64) -> Vec<bool> {
    let own_max = trailing_window_max(points, window_days);

    points
        .iter()
        .zip(own_max)
        .map(|(&(t, value), window_max)| {
            if value.is_nan() || value != window_max {
                return false;
            }
            points
                .iter()
                .filter(|(d, v)| !v.is_nan() && in_trailing_window(t, *d, window_days))
                .all(|(_, v)| *v <= value)
        })
        .collect()
}

/// Running max along the slice. Leading NaNs stay NaN, later NaNs carry the
/// max so far.
pub fn cumulative_max(values: &[f64]) -> Vec<f64> {
    let mut running = f64::NAN;
    values
        .iter()
        .map(|&v| {
            running = running.max(v);
            running
        })
        .collect()
}

/// `d` lies in the trailing window `(t - window_days, t]`.
fn in_trailing_window(d: NaiveDate, t: NaiveDate, window_days: i64) -> bool {
    let back = (t - d).num_days();
    (0..window_days).contains(&back)
}
