//! The five view computations and their tabular results.
//!
//! Each function takes the immutable dataset plus the user's options and
//! returns a fresh typed result; `to_frame` turns it into the polars table
//! handed to the rendering layer.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::binning::{self, BinInput, BinWidth, CategoryDimension, HeatmapGrid, HeatmapMetric};
use crate::error::DashError;
use crate::extremum::{best_lift_flags, group_positions};
use crate::join::ClassifiedLift;
use crate::records::{VolumeRecord, WellBeingRecord};
use crate::schema::*;
use crate::smoothing::smooth_series;

/// Decay rates the dashboard slider allows.
pub const MAX_DECAY_RATE: f64 = 0.3;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn validate_decay_rate(decay_rate: f64) -> Result<f64, DashError> {
    if (0.0..=MAX_DECAY_RATE).contains(&decay_rate) {
        Ok(decay_rate)
    } else {
        Err(DashError::invalid_parameter(
            "decay_rate (expected 0.0 to 0.3)",
            decay_rate,
        ))
    }
}

fn date_column(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Column, DashError> {
    let days: Vec<i32> = dates
        .map(|d| d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
        .collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?.into())
}

// ── 1RM trend ───────────────────────────────────────────────────────────────

/// Which precomputed line is drawn under the 1RM scatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    Rolling,
    Cummax,
}

impl FromStr for LineMode {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rolling" | "rolling_90d_max" => Ok(LineMode::Rolling),
            "cummax" | "cummax_one_rep_max" => Ok(LineMode::Cummax),
            _ => Err(DashError::invalid_parameter(
                "line_mode (expected 'rolling' or 'cummax')",
                s,
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OneRepMaxRow {
    pub exercise_name: String,
    pub date: NaiveDate,
    pub reps: u32,
    pub one_rep_max: f64,
    pub line_value: f64,
    pub best_lift: bool,
}

#[derive(Debug, Clone)]
pub struct OneRepMaxSeries {
    pub highlight_best: bool,
    /// Ordered by date, then input order.
    pub rows: Vec<OneRepMaxRow>,
}

/// Scatter + line rows for the selected exercises.
///
/// `show_single_rep = false` drops sets of exactly one rep before anything
/// else, so best-lift flags describe the plotted points only.
pub fn one_rep_max_series(
    lifts: &[ClassifiedLift],
    exercise_names: &HashSet<String>,
    line_mode: LineMode,
    highlight_best: bool,
    show_single_rep: bool,
    best_window_days: i64,
) -> OneRepMaxSeries {
    let mut selected: Vec<&ClassifiedLift> = lifts
        .iter()
        .filter(|c| exercise_names.contains(&c.lift.exercise_name))
        .filter(|c| show_single_rep || c.lift.reps != 1)
        .collect();
    selected.sort_by_key(|c| c.lift.date);

    let mut best = vec![false; selected.len()];
    if highlight_best {
        for (_, positions) in group_positions(selected.iter().map(|c| c.lift.exercise_name.as_str())) {
            let points: Vec<(NaiveDate, f64)> = positions
                .iter()
                .map(|&p| (selected[p].lift.date, selected[p].lift.one_rep_max))
                .collect();
            for (&p, flag) in positions.iter().zip(best_lift_flags(&points, best_window_days)) {
                best[p] = flag;
            }
        }
    }

    let rows = selected
        .into_iter()
        .zip(best)
        .map(|(c, best_lift)| OneRepMaxRow {
            exercise_name: c.lift.exercise_name.clone(),
            date: c.lift.date,
            reps: c.lift.reps,
            one_rep_max: c.lift.one_rep_max,
            line_value: match line_mode {
                LineMode::Rolling => c.lift.rolling_90d_max,
                LineMode::Cummax => c.lift.cummax_one_rep_max,
            },
            best_lift,
        })
        .collect();

    OneRepMaxSeries {
        highlight_best,
        rows,
    }
}

impl OneRepMaxSeries {
    pub fn to_frame(&self) -> Result<DataFrame, DashError> {
        let mut columns: Vec<Column> = vec![
            Column::new(
                lifts::EXERCISE_NAME.into(),
                self.rows.iter().map(|r| r.exercise_name.as_str()).collect::<Vec<_>>(),
            ),
            date_column(lifts::DATE, self.rows.iter().map(|r| r.date))?,
            Column::new(
                lifts::REPS.into(),
                self.rows.iter().map(|r| r.reps).collect::<Vec<_>>(),
            ),
            Column::new(
                lifts::ONE_REP_MAX.into(),
                self.rows.iter().map(|r| r.one_rep_max).collect::<Vec<_>>(),
            ),
            Column::new(
                lifts::LINE_VALUE.into(),
                self.rows.iter().map(|r| r.line_value).collect::<Vec<_>>(),
            ),
        ];
        if self.highlight_best {
            columns.push(Column::new(
                lifts::BEST_LIFT.into(),
                self.rows.iter().map(|r| r.best_lift).collect::<Vec<_>>(),
            ));
        }
        Ok(DataFrame::new(columns)?)
    }
}

// ── Volume heatmap ──────────────────────────────────────────────────────────

pub fn volume_heatmap(
    lifts: &[ClassifiedLift],
    metric: HeatmapMetric,
    dimension: CategoryDimension,
    width: BinWidth,
) -> Result<HeatmapGrid, DashError> {
    let inputs: Vec<BinInput<'_>> = lifts
        .iter()
        .map(|c| BinInput {
            date: c.lift.date,
            category: match dimension {
                CategoryDimension::Exercise => Some(c.lift.exercise_name.as_str()),
                CategoryDimension::Anatomical => c.anterior_posterior.as_deref(),
                CategoryDimension::Pattern => c.push_pull_legs.as_deref(),
            },
            one_rep_max: c.lift.one_rep_max,
        })
        .collect();
    binning::bin_records(&inputs, metric, dimension, width)
}

impl HeatmapGrid {
    /// Cells with only the selected metric column.
    pub fn to_frame(&self) -> Result<DataFrame, DashError> {
        let value_column = match self.metric {
            HeatmapMetric::Frequency => Column::new(
                heatmap::FREQUENCY.into(),
                self.cells.iter().map(|c| c.frequency).collect::<Vec<_>>(),
            ),
            HeatmapMetric::Volume => Column::new(
                heatmap::VOLUME.into(),
                self.cells.iter().map(|c| c.volume).collect::<Vec<_>>(),
            ),
        };
        let columns = vec![
            date_column(heatmap::TIME_BIN, self.cells.iter().map(|c| c.time_bin))?,
            Column::new(
                heatmap::CATEGORY_VALUE.into(),
                self.cells.iter().map(|c| c.category_value.as_str()).collect::<Vec<_>>(),
            ),
            value_column,
            Column::new(
                heatmap::BUCKET.into(),
                self.cells.iter().map(|c| c.bucket.as_str()).collect::<Vec<_>>(),
            ),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

// ── Smoothed series ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedRow {
    pub metric: String,
    pub date: NaiveDate,
    pub value: f64,
    /// Partial-questionnaire score; well-being rows only.
    pub value_partial: Option<f64>,
    pub smoothed: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SmoothedSeries {
    pub rows: Vec<SmoothedRow>,
}

/// Pairs every valid observation with the smoothed value at its date.
/// Points are `(date, value, value_partial)`.
fn smoothed_rows(
    metric: &str,
    mut points: Vec<(NaiveDate, f64, Option<f64>)>,
    decay_rate: f64,
) -> Vec<SmoothedRow> {
    points.retain(|(_, v, _)| !v.is_nan());
    points.sort_by_key(|(d, _, _)| *d);
    let series: Vec<(NaiveDate, f64)> = points.iter().map(|(d, v, _)| (*d, *v)).collect();
    let smoothed: HashMap<NaiveDate, f64> = smooth_series(&series, decay_rate).into_iter().collect();

    points
        .into_iter()
        .map(|(date, value, value_partial)| SmoothedRow {
            metric: metric.to_string(),
            date,
            value,
            value_partial,
            smoothed: smoothed.get(&date).copied().unwrap_or(f64::NAN),
        })
        .collect()
}

/// Daily volume with its smoothed trend. Rest days (volume 0) can be left
/// out before smoothing.
pub fn volume_over_time(
    volume: &[VolumeRecord],
    decay_rate: f64,
    exclude_zero_days: bool,
) -> Result<SmoothedSeries, DashError> {
    let decay_rate = validate_decay_rate(decay_rate)?;
    let points = volume
        .iter()
        .filter(|v| !exclude_zero_days || v.one_rep_max != 0.0)
        .map(|v| (v.date, v.one_rep_max, None))
        .collect();
    Ok(SmoothedSeries {
        rows: smoothed_rows("volume", points, decay_rate),
    })
}

/// One smoothed series per requested metric, in request order. Unknown
/// metrics simply produce no rows.
pub fn mental_health_series(
    well_being: &[WellBeingRecord],
    metrics: &[String],
    decay_rate: f64,
) -> Result<SmoothedSeries, DashError> {
    let decay_rate = validate_decay_rate(decay_rate)?;
    let mut seen = BTreeSet::new();
    let mut rows = Vec::new();
    for metric in metrics.iter().filter(|m| seen.insert(m.as_str())) {
        let points = well_being
            .iter()
            .filter(|r| &r.metric == metric)
            .map(|r| (r.date, r.value, r.value_partial))
            .collect();
        rows.extend(smoothed_rows(metric, points, decay_rate));
    }
    Ok(SmoothedSeries { rows })
}

impl SmoothedSeries {
    pub fn to_frame(&self) -> Result<DataFrame, DashError> {
        let columns = vec![
            date_column(smoothed::DATE, self.rows.iter().map(|r| r.date))?,
            Column::new(
                smoothed::METRIC.into(),
                self.rows.iter().map(|r| r.metric.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                smoothed::VALUE.into(),
                self.rows.iter().map(|r| r.value).collect::<Vec<_>>(),
            ),
            Column::new(
                smoothed::VALUE_PARTIAL.into(),
                self.rows.iter().map(|r| r.value_partial).collect::<Vec<_>>(),
            ),
            Column::new(
                smoothed::SMOOTHED.into(),
                self.rows.iter().map(|r| r.smoothed).collect::<Vec<_>>(),
            ),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

// ── Goal progress ───────────────────────────────────────────────────────────

impl crate::goals::GoalProgress {
    pub fn to_frame(&self) -> Result<DataFrame, DashError> {
        let columns = vec![
            Column::new(
                goal::EXERCISE_NAME.into(),
                self.rows.iter().map(|r| r.exercise_name.as_str()).collect::<Vec<_>>(),
            ),
            date_column(goal::DATE, self.rows.iter().map(|r| r.date))?,
            Column::new(
                goal::ONE_REP_MAX.into(),
                self.rows.iter().map(|r| r.one_rep_max).collect::<Vec<_>>(),
            ),
            Column::new(
                goal::CUMMAX_ONE_REP_MAX.into(),
                self.rows.iter().map(|r| r.cummax_one_rep_max).collect::<Vec<_>>(),
            ),
            Column::new(
                goal::BASELINE.into(),
                self.rows.iter().map(|r| r.baseline).collect::<Vec<_>>(),
            ),
            Column::new(
                goal::TARGET.into(),
                self.rows.iter().map(|r| r.target).collect::<Vec<_>>(),
            ),
            Column::new(
                goal::PROGRESS.into(),
                self.rows.iter().map(|r| r.progress).collect::<Vec<_>>(),
            ),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::join::join_taxonomy;
    use crate::records::{ExerciseTaxonomy, LiftRecord, TaxonomyEntry};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(offset)
    }

    fn lifts() -> Vec<ClassifiedLift> {
        let mut bench = LiftRecord::new("Bench Press (Barbell)", day(0), 5, 10.0);
        bench.rolling_90d_max = 10.0;
        bench.cummax_one_rep_max = 10.0;
        let records = vec![
            bench,
            LiftRecord::new("Bench Press (Barbell)", day(5), 1, 20.0),
            LiftRecord::new("Bench Press (Barbell)", day(40), 5, 5.0),
            LiftRecord::new("Lat Pulldown (Cable)", day(2), 10, 90.0),
            LiftRecord::new("Unknown Thing", day(3), 10, 40.0),
        ];
        let taxonomy = ExerciseTaxonomy::from_entries([
            TaxonomyEntry {
                exercise_name: "Bench Press (Barbell)".into(),
                anterior_posterior: "anterior".into(),
                push_pull_legs: "push".into(),
            },
            TaxonomyEntry {
                exercise_name: "Lat Pulldown (Cable)".into(),
                anterior_posterior: "posterior".into(),
                push_pull_legs: "pull".into(),
            },
        ])
        .unwrap();
        join_taxonomy(&records, &taxonomy).unwrap()
    }

    fn bench_only() -> HashSet<String> {
        HashSet::from(["Bench Press (Barbell)".to_string()])
    }

    #[test]
    fn one_rep_max_rows_flag_best_lifts() {
        let series = one_rep_max_series(&lifts(), &bench_only(), LineMode::Cummax, true, true, 30);
        let flags: Vec<bool> = series.rows.iter().map(|r| r.best_lift).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert_eq!(series.rows[0].line_value, 10.0);

        let frame = series.to_frame().unwrap();
        assert_eq!(frame.height(), 3);
        assert!(frame.column(lifts::BEST_LIFT).is_ok());
        assert_eq!(frame.column(lifts::DATE).unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn hiding_single_rep_sets_changes_the_points() {
        let series = one_rep_max_series(&lifts(), &bench_only(), LineMode::Rolling, true, false, 30);
        assert_eq!(series.rows.len(), 2);
        assert!(series.rows.iter().all(|r| r.reps != 1));
        assert!(series.rows.iter().all(|r| r.best_lift));

        let frame = one_rep_max_series(&lifts(), &bench_only(), LineMode::Rolling, false, true, 30)
            .to_frame()
            .unwrap();
        assert!(frame.column(lifts::BEST_LIFT).is_err());
    }

    #[test]
    fn heatmap_frame_keeps_only_the_selected_metric() {
        let grid = volume_heatmap(
            &lifts(),
            HeatmapMetric::Volume,
            CategoryDimension::Pattern,
            BinWidth::TwoMonths,
        )
        .unwrap();
        // the unclassified lift is dropped
        let total: u32 = grid.cells.iter().map(|c| c.frequency).sum();
        assert_eq!(total, 4);

        let frame = grid.to_frame().unwrap();
        assert!(frame.column(heatmap::VOLUME).is_ok());
        assert!(frame.column(heatmap::FREQUENCY).is_err());
    }

    #[test]
    fn exercise_dimension_keeps_every_joined_row() {
        let joined = lifts();
        let grid = volume_heatmap(
            &joined,
            HeatmapMetric::Frequency,
            CategoryDimension::Exercise,
            BinWidth::FourMonths,
        )
        .unwrap();
        let total: u32 = grid.cells.iter().map(|c| c.frequency).sum();
        assert_eq!(total as usize, joined.len());
    }

    #[test]
    fn volume_over_time_can_skip_rest_days() {
        let volume: Vec<VolumeRecord> = [100.0, 0.0, 0.0, 200.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| VolumeRecord {
                date: day(i as i64),
                one_rep_max: v,
            })
            .collect();

        let all = volume_over_time(&volume, 0.0, false).unwrap();
        assert_eq!(all.rows.len(), 4);
        assert!((all.rows[0].smoothed - 75.0).abs() < 1e-12);

        let training = volume_over_time(&volume, 0.0, true).unwrap();
        assert_eq!(training.rows.len(), 2);
        assert!((training.rows[1].smoothed - 150.0).abs() < 1e-12);
    }

    #[test]
    fn decay_rate_is_bounded() {
        assert!(volume_over_time(&[], 0.31, false).is_err());
        assert!(volume_over_time(&[], -0.01, false).is_err());
        assert!(volume_over_time(&[], f64::NAN, false).is_err());
        assert!(volume_over_time(&[], 0.3, false).unwrap().rows.is_empty());
    }

    fn observation(offset: i64, metric: &str, value: f64, value_partial: Option<f64>) -> WellBeingRecord {
        WellBeingRecord {
            date: day(offset),
            metric: metric.into(),
            value,
            value_partial,
            note: None,
        }
    }

    #[test]
    fn mental_health_series_per_metric() {
        let records = vec![
            observation(0, "mood", 20.0, Some(15.0)),
            observation(1, "anxiety", -40.0, None),
            observation(2, "mood", 20.0, None),
            observation(3, "mood", f64::NAN, None),
        ];
        let metrics = vec!["mood".to_string(), "sleep".to_string(), "mood".to_string()];
        let series = mental_health_series(&records, &metrics, 0.2).unwrap();
        assert_eq!(series.rows.len(), 2);
        assert!(series.rows.iter().all(|r| r.metric == "mood" && r.smoothed == 20.0));
        assert_eq!(series.rows[0].value_partial, Some(15.0));

        let frame = series.to_frame().unwrap();
        assert_eq!(frame.width(), 5);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.column(smoothed::VALUE_PARTIAL).unwrap().null_count(), 1);
    }
}
