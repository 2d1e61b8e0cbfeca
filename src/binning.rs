//! Heatmap binning: (time bin × category) aggregation and bucket labels.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, Months, NaiveDate};
use polars::prelude::*;

use crate::error::DashError;
use crate::schema::{heatmap, lifts};

/// Which aggregate the heatmap colours by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeatmapMetric {
    Frequency,
    Volume,
}

/// Category axis of the heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryDimension {
    /// Raw exercise name (top 10 by frequency).
    Exercise,
    /// Anterior / posterior chain.
    Anatomical,
    /// Push / pull / legs.
    Pattern,
}

/// Width of a time bin in calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinWidth {
    TwoMonths,
    FourMonths,
}

impl BinWidth {
    pub fn months(self) -> u32 {
        match self {
            BinWidth::TwoMonths => 2,
            BinWidth::FourMonths => 4,
        }
    }
}

impl FromStr for HeatmapMetric {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frequency" => Ok(HeatmapMetric::Frequency),
            "volume" => Ok(HeatmapMetric::Volume),
            _ => Err(DashError::invalid_parameter(
                "metric (expected 'Frequency' or 'Volume')",
                s,
            )),
        }
    }
}

impl FromStr for CategoryDimension {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exercise" | "exercise_name" => Ok(CategoryDimension::Exercise),
            "anatomical" | "anterior_posterior" => Ok(CategoryDimension::Anatomical),
            "pattern" | "push_pull_legs" => Ok(CategoryDimension::Pattern),
            _ => Err(DashError::invalid_parameter(
                "category (expected 'exercise', 'anatomical' or 'pattern')",
                s,
            )),
        }
    }
}

impl FromStr for BinWidth {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2" | "2mo" | "2 months" => Ok(BinWidth::TwoMonths),
            "4" | "4mo" | "4 months" => Ok(BinWidth::FourMonths),
            _ => Err(DashError::invalid_parameter(
                "bin_width (expected '2mo' or '4mo')",
                s,
            )),
        }
    }
}

// ── Bucket thresholds ───────────────────────────────────────────────────────

type ThresholdKey = (HeatmapMetric, CategoryDimension, BinWidth);

/// Lower bucket edges. Buckets are `[edge_i, edge_i+1)`, the last one is
/// unbounded above. Volume edges are 100× the Frequency edges.
const THRESHOLD_TABLE: [(ThresholdKey, &[f64]); 12] = {
    use BinWidth::*;
    use CategoryDimension::*;
    use HeatmapMetric::*;
    [
        ((Frequency, Exercise, TwoMonths), &[0.0, 5.0, 15.0, 30.0]),
        ((Frequency, Exercise, FourMonths), &[0.0, 10.0, 30.0, 60.0]),
        ((Frequency, Anatomical, TwoMonths), &[0.0, 20.0, 60.0, 150.0]),
        ((Frequency, Anatomical, FourMonths), &[0.0, 40.0, 120.0, 300.0]),
        ((Frequency, Pattern, TwoMonths), &[0.0, 30.0, 100.0, 200.0]),
        ((Frequency, Pattern, FourMonths), &[0.0, 60.0, 200.0, 400.0]),
        ((Volume, Exercise, TwoMonths), &[0.0, 500.0, 1500.0, 3000.0]),
        ((Volume, Exercise, FourMonths), &[0.0, 1000.0, 3000.0, 6000.0]),
        ((Volume, Anatomical, TwoMonths), &[0.0, 2000.0, 6000.0, 15000.0]),
        ((Volume, Anatomical, FourMonths), &[0.0, 4000.0, 12000.0, 30000.0]),
        ((Volume, Pattern, TwoMonths), &[0.0, 3000.0, 10000.0, 20000.0]),
        ((Volume, Pattern, FourMonths), &[0.0, 6000.0, 20000.0, 40000.0]),
    ]
};

static THRESHOLDS: LazyLock<HashMap<ThresholdKey, &'static [f64]>> =
    LazyLock::new(|| THRESHOLD_TABLE.into_iter().collect());

/// Bucket edges for a (metric, dimension, width) combination.
pub fn thresholds(
    metric: HeatmapMetric,
    dimension: CategoryDimension,
    width: BinWidth,
) -> &'static [f64] {
    THRESHOLDS
        .get(&(metric, dimension, width))
        .copied()
        .unwrap_or(&[0.0])
}

/// Label of the bucket holding `value`, e.g. `"30-100"` or `"200+"`.
pub fn bucket_label(value: f64, edges: &[f64]) -> String {
    let idx = edges
        .iter()
        .rposition(|&edge| value >= edge)
        .unwrap_or(0);
    match edges.get(idx + 1) {
        Some(upper) => format!("{}-{}", edges[idx], upper),
        None => format!("{}+", edges.get(idx).copied().unwrap_or(0.0)),
    }
}

/// All labels for a set of edges, lowest first.
pub fn bucket_labels(edges: &[f64]) -> Vec<String> {
    edges.iter().map(|&e| bucket_label(e, edges)).collect()
}

// ── Time bins ───────────────────────────────────────────────────────────────

/// Start of the `width`-month bin containing `date`, bins anchored at
/// `anchor`. `None` for dates before the anchor.
pub fn bin_start(anchor: NaiveDate, date: NaiveDate, width: BinWidth) -> Option<NaiveDate> {
    if date < anchor {
        return None;
    }
    let months = width.months();
    let start_of = |idx: u32| anchor.checked_add_months(Months::new(idx * months));

    let mut elapsed = (date.year() - anchor.year()) * 12 + date.month() as i32
        - anchor.month() as i32;
    if date.day() < anchor.day() {
        elapsed -= 1;
    }
    let mut idx = elapsed.max(0) as u32 / months;

    // month-end clamping can leave the estimate one bin off either way
    while start_of(idx + 1).is_some_and(|next| next <= date) {
        idx += 1;
    }
    while idx > 0 && start_of(idx).is_some_and(|start| start > date) {
        idx -= 1;
    }
    start_of(idx)
}

// ── Aggregation ─────────────────────────────────────────────────────────────

/// One row handed to the binner: the date, the category value for the
/// selected dimension and the 1RM to sum.
#[derive(Debug, Clone, Copy)]
pub struct BinInput<'a> {
    pub date: NaiveDate,
    pub category: Option<&'a str>,
    pub one_rep_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapCell {
    pub time_bin: NaiveDate,
    pub category_value: String,
    pub frequency: u32,
    pub volume: f64,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct HeatmapGrid {
    pub metric: HeatmapMetric,
    pub dimension: CategoryDimension,
    pub width: BinWidth,
    /// Category axis, most frequent first.
    pub categories: Vec<String>,
    /// Bucket labels in ascending order.
    pub buckets: Vec<String>,
    /// Non-empty cells ordered by time bin, then category axis.
    pub cells: Vec<HeatmapCell>,
}

/// Number of exercises kept on the category axis for the exercise dimension.
pub const TOP_EXERCISES: usize = 10;

/// Grouping key: position of the category on the axis.
const CATEGORY_RANK: &str = "category_rank";

/// Values that count as "no category" and drop the record.
fn is_unclassified(category: Option<&str>) -> bool {
    match category {
        None => true,
        Some(c) => {
            let c = c.trim();
            c.is_empty() || c.eq_ignore_ascii_case("unclear")
        }
    }
}

/// Aggregates `records` into a (time bin × category) grid.
///
/// Bins are anchored at the earliest date in `records`, including records
/// later dropped for lacking a category.
pub fn bin_records(
    records: &[BinInput<'_>],
    metric: HeatmapMetric,
    dimension: CategoryDimension,
    width: BinWidth,
) -> Result<HeatmapGrid, DashError> {
    let edges = thresholds(metric, dimension, width);
    let mut grid = HeatmapGrid {
        metric,
        dimension,
        width,
        categories: Vec::new(),
        buckets: bucket_labels(edges),
        cells: Vec::new(),
    };

    let Some(anchor) = records.iter().map(|r| r.date).min() else {
        return Ok(grid);
    };

    let mut eligible: Vec<(NaiveDate, &str, f64)> = records
        .iter()
        .filter(|r| !is_unclassified(r.category))
        .filter_map(|r| Some((r.date, r.category?.trim(), r.one_rep_max)))
        .collect();
    eligible.sort_by_key(|(date, _, _)| *date);

    // category totals in first-eligible order; stable sort keeps that order on ties
    let mut totals: Vec<(&str, usize)> = Vec::new();
    let mut total_index: HashMap<&str, usize> = HashMap::new();
    for &(_, category, _) in &eligible {
        let slot = *total_index.entry(category).or_insert_with(|| {
            totals.push((category, 0));
            totals.len() - 1
        });
        totals[slot].1 += 1;
    }
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    if dimension == CategoryDimension::Exercise {
        totals.truncate(TOP_EXERCISES);
    }

    let rank: HashMap<&str, usize> = totals
        .iter()
        .enumerate()
        .map(|(i, (category, _))| (*category, i))
        .collect();

    let mut day_numbers: Vec<i32> = Vec::with_capacity(eligible.len());
    let mut ranks: Vec<u32> = Vec::with_capacity(eligible.len());
    let mut values: Vec<Option<f64>> = Vec::with_capacity(eligible.len());
    for &(date, category, one_rep_max) in &eligible {
        let Some(&category_rank) = rank.get(category) else {
            continue;
        };
        let Some(time_bin) = bin_start(anchor, date, width) else {
            continue;
        };
        day_numbers.push(time_bin.num_days_from_ce());
        ranks.push(category_rank as u32);
        values.push(Some(one_rep_max).filter(|v| !v.is_nan()));
    }

    let cells = DataFrame::new(vec![
        Column::new(heatmap::TIME_BIN.into(), day_numbers),
        Column::new(CATEGORY_RANK.into(), ranks),
        Column::new(lifts::ONE_REP_MAX.into(), values),
    ])?
    .lazy()
    .group_by([col(heatmap::TIME_BIN), col(CATEGORY_RANK)])
    .agg([
        len().cast(DataType::UInt32).alias(heatmap::FREQUENCY),
        col(lifts::ONE_REP_MAX).sum().alias(heatmap::VOLUME),
    ])
    .sort([heatmap::TIME_BIN, CATEGORY_RANK], SortMultipleOptions::default())
    .collect()?;

    let bins = cells.column(heatmap::TIME_BIN)?.i32()?;
    let cell_ranks = cells.column(CATEGORY_RANK)?.u32()?;
    let frequencies = cells.column(heatmap::FREQUENCY)?.u32()?;
    let volumes = cells.column(heatmap::VOLUME)?.f64()?;

    for i in 0..cells.height() {
        let (Some(day), Some(category_rank)) = (bins.get(i), cell_ranks.get(i)) else {
            continue;
        };
        let Some(time_bin) = NaiveDate::from_num_days_from_ce_opt(day) else {
            continue;
        };
        let frequency = frequencies.get(i).unwrap_or(0);
        let volume = volumes.get(i).unwrap_or(0.0);
        let value = match metric {
            HeatmapMetric::Frequency => f64::from(frequency),
            HeatmapMetric::Volume => volume,
        };
        grid.cells.push(HeatmapCell {
            time_bin,
            category_value: totals[category_rank as usize].0.to_string(),
            frequency,
            volume,
            bucket: bucket_label(value, edges),
        });
    }
    grid.categories = totals.into_iter().map(|(c, _)| c.to_string()).collect();
    Ok(grid)
}

impl fmt::Display for HeatmapMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeatmapMetric::Frequency => write!(f, "Frequency"),
            HeatmapMetric::Volume => write!(f, "Volume"),
        }
    }
}
