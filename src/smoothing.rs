//! Exponential time-decay weighted averaging.
//!
//! Every observation contributes to every query date, attenuated by
//! `exp(-epsilon * |days apart|)`. With `epsilon = 0` this is the plain mean.

use std::collections::BTreeSet;

use chrono::NaiveDate;

/// Weighted average of `series` as seen from `at`.
///
/// NaN observations are skipped. Returns NaN when nothing is left to
/// average.
pub fn weighted_average(series: &[(NaiveDate, f64)], epsilon: f64, at: NaiveDate) -> f64 {
    let valid = || {
        series
            .iter()
            .filter(|(_, v)| !v.is_nan())
            .map(|&(date, value)| ((date - at).num_days().abs() as f64, value))
    };
    let Some(reference) = valid().map(|(_, v)| v).next() else {
        return f64::NAN;
    };
    // weights relative to the nearest observation, which keeps its weight at 1
    let nearest = valid().map(|(d, _)| d).fold(f64::INFINITY, f64::min);

    // deviations from the first value, so a constant series comes back exact
    let mut sum_dw = 0.0;
    let mut sum_w = 0.0;
    for (distance, value) in valid() {
        let weight = (-epsilon * (distance - nearest)).exp();
        sum_dw += (value - reference) * weight;
        sum_w += weight;
    }

    if sum_w > 0.0 {
        reference + sum_dw / sum_w
    } else {
        f64::NAN
    }
}

/// Smoothed trend line: one value per distinct date of `series`, ascending.
pub fn smooth_series(series: &[(NaiveDate, f64)], epsilon: f64) -> Vec<(NaiveDate, f64)> {
    let dates: BTreeSet<NaiveDate> = series
        .iter()
        .filter(|(_, v)| !v.is_nan())
        .map(|(d, _)| *d)
        .collect();

    dates
        .into_iter()
        .map(|d| (d, weighted_average(series, epsilon, d)))
        .collect()
}
