use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::DashError;
use crate::preprocess;
use crate::records::{ExerciseTaxonomy, LiftRecord, TaxonomyEntry, VolumeRecord, WellBeingRecord};
use crate::schema::*;

// ── CSV helpers ─────────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub(crate) fn read_csv_as_strings(path: &Path) -> Result<DataFrame, DashError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

pub(crate) fn require_columns(
    df: &DataFrame,
    dataset: &str,
    required: &[&str],
) -> Result<(), DashError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(DashError::MissingColumn {
                dataset: dataset.to_string(),
                column: col_name.to_string(),
            });
        }
    }
    Ok(())
}

/// Strip and cast string columns to Float64. Unparseable cells become null.
pub(crate) fn parse_float_columns(df: DataFrame, columns: &[&str]) -> Result<DataFrame, DashError> {
    let exprs: Vec<Expr> = columns
        .iter()
        .map(|c| {
            col(*c)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::Float64)
        })
        .collect();
    Ok(df.lazy().with_columns(exprs).collect()?)
}

/// `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        s.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    })
}

/// Tracks rows dropped while loading one dataset.
struct RowFilter<'a> {
    dataset: &'a str,
    strict: bool,
    excluded: usize,
}

impl<'a> RowFilter<'a> {
    fn new(dataset: &'a str, strict: bool) -> Self {
        Self {
            dataset,
            strict,
            excluded: 0,
        }
    }

    /// `row` is the 1-based data row (header not counted).
    fn exclude(&mut self, row: usize, reason: &str) -> Result<(), DashError> {
        if self.strict {
            return Err(DashError::InvalidRow {
                dataset: self.dataset.to_string(),
                row,
                reason: reason.to_string(),
            });
        }
        debug!(dataset = self.dataset, row, reason, "excluding row");
        self.excluded += 1;
        Ok(())
    }

    fn finish(self, kept: usize) {
        if self.excluded > 0 {
            warn!(
                dataset = self.dataset,
                excluded = self.excluded,
                kept,
                "malformed rows excluded"
            );
        }
        info!(dataset = self.dataset, rows = kept, "loaded");
    }
}

// ── Datasets ────────────────────────────────────────────────────────────────

/// Load `weightlifting_data`.
///
/// Required columns: exercise_name, date, reps, and one_rep_max (or the raw
/// set weight, from which the 1RM is estimated; an optional `body_mass`
/// column then supplies the load of bodyweight exercises).
/// `cummax_one_rep_max` and `rolling_90d_max` are used when present and
/// derived otherwise.
pub fn load_lifts(
    path: &Path,
    rolling_window_days: i64,
    strict: bool,
) -> Result<Vec<LiftRecord>, DashError> {
    const DATASET: &str = "weightlifting_data";
    let raw = read_csv_as_strings(path)?;
    require_columns(&raw, DATASET, &lifts::REQUIRED)?;

    let has_one_rep_max = raw.column(lifts::ONE_REP_MAX).is_ok();
    if !has_one_rep_max && raw.column(lifts::WEIGHT).is_err() {
        return Err(DashError::MissingColumn {
            dataset: DATASET.to_string(),
            column: lifts::ONE_REP_MAX.to_string(),
        });
    }
    let has_derived =
        raw.column(lifts::CUMMAX_ONE_REP_MAX).is_ok() && raw.column(lifts::ROLLING_90D_MAX).is_ok();
    let has_body_mass = !has_one_rep_max && raw.column(lifts::BODY_MASS).is_ok();

    let mut numeric = vec![
        lifts::REPS,
        if has_one_rep_max {
            lifts::ONE_REP_MAX
        } else {
            lifts::WEIGHT
        },
    ];
    if has_derived {
        numeric.extend([lifts::CUMMAX_ONE_REP_MAX, lifts::ROLLING_90D_MAX]);
    }
    if has_body_mass {
        numeric.push(lifts::BODY_MASS);
    }
    let df = parse_float_columns(raw, &numeric)?;

    let names = df.column(lifts::EXERCISE_NAME)?.str()?;
    let dates = df.column(lifts::DATE)?.str()?;
    let reps = df.column(lifts::REPS)?.f64()?;
    let load = df.column(numeric[1])?.f64()?;
    let derived = if has_derived {
        Some((
            df.column(lifts::CUMMAX_ONE_REP_MAX)?.f64()?,
            df.column(lifts::ROLLING_90D_MAX)?.f64()?,
        ))
    } else {
        None
    };
    let body_mass = if has_body_mass {
        Some(df.column(lifts::BODY_MASS)?.f64()?)
    } else {
        None
    };

    let mut filter = RowFilter::new(DATASET, strict);
    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = i + 1;
        let Some(name) = names.get(i).map(str::trim).filter(|n| !n.is_empty()) else {
            filter.exclude(row, "missing exercise_name")?;
            continue;
        };
        let Some(date) = dates.get(i).and_then(parse_date) else {
            filter.exclude(row, "unparseable date")?;
            continue;
        };
        let Some(rep_count) = reps
            .get(i)
            .filter(|r| r.is_finite() && *r >= 1.0 && r.fract() == 0.0)
        else {
            filter.exclude(row, "reps must be a whole number >= 1")?;
            continue;
        };

        let rep_count = rep_count as u32;
        let one_rep_max = match load.get(i) {
            Some(orm) if has_one_rep_max => orm,
            Some(weight) => preprocess::estimate_one_rep_max(
                name,
                weight,
                body_mass.and_then(|b| b.get(i)),
                rep_count,
            ),
            None => f64::NAN,
        };
        let mut record = LiftRecord::new(name, date, rep_count, one_rep_max);
        if let Some((cummax, rolling)) = derived {
            record.cummax_one_rep_max = cummax.get(i).unwrap_or(f64::NAN);
            record.rolling_90d_max = rolling.get(i).unwrap_or(f64::NAN);
        }
        records.push(record);
    }
    filter.finish(records.len());

    if !has_derived {
        info!(dataset = DATASET, "deriving cummax and rolling max columns");
        records = preprocess::with_derived_maxima(records, rolling_window_days);
    }
    Ok(records)
}

/// Load `exercise_classifications`. Repeated exercise names keep their first
/// row.
pub fn load_taxonomy(path: &Path, strict: bool) -> Result<ExerciseTaxonomy, DashError> {
    const DATASET: &str = "exercise_classifications";
    let df = read_csv_as_strings(path)?;
    require_columns(&df, DATASET, &taxonomy::REQUIRED)?;

    let names = df.column(taxonomy::EXERCISE_NAME)?.str()?;
    let anatomical = df.column(taxonomy::ANTERIOR_POSTERIOR)?.str()?;
    let pattern = df.column(taxonomy::PUSH_PULL_LEGS)?.str()?;

    let mut filter = RowFilter::new(DATASET, strict);
    let mut entries = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(name) = names.get(i).map(str::trim).filter(|n| !n.is_empty()) else {
            filter.exclude(i + 1, "missing exercise_name")?;
            continue;
        };
        entries.push(TaxonomyEntry {
            exercise_name: name.to_string(),
            anterior_posterior: anatomical.get(i).unwrap_or("").trim().to_string(),
            push_pull_legs: pattern.get(i).unwrap_or("").trim().to_string(),
        });
    }

    let taxonomy = ExerciseTaxonomy::from_entries(entries)?;
    filter.finish(taxonomy.len());
    Ok(taxonomy)
}

/// Load `mental_health_data`. Only the first row of a (date, metric) pair
/// is kept.
pub fn load_well_being(path: &Path, strict: bool) -> Result<Vec<WellBeingRecord>, DashError> {
    const DATASET: &str = "mental_health_data";
    let raw = read_csv_as_strings(path)?;
    require_columns(&raw, DATASET, &well_being::REQUIRED)?;
    let has_partial = raw.column(well_being::VALUE_PARTIAL).is_ok();
    let numeric: &[&str] = if has_partial {
        &[well_being::VALUE, well_being::VALUE_PARTIAL]
    } else {
        &[well_being::VALUE]
    };
    let df = parse_float_columns(raw, numeric)?;

    let dates = df.column(well_being::DATE)?.str()?;
    let metrics = df.column(well_being::METRIC)?.str()?;
    let values = df.column(well_being::VALUE)?.f64()?;
    let notes = match df.column(well_being::NOTE) {
        Ok(c) => Some(c.str()?),
        Err(_) => None,
    };
    let partials = if has_partial {
        Some(df.column(well_being::VALUE_PARTIAL)?.f64()?)
    } else {
        None
    };

    let mut filter = RowFilter::new(DATASET, strict);
    let mut seen: HashSet<(NaiveDate, String)> = HashSet::new();
    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = i + 1;
        let Some(date) = dates.get(i).and_then(parse_date) else {
            filter.exclude(row, "unparseable date")?;
            continue;
        };
        let Some(metric) = metrics.get(i).map(str::trim).filter(|m| !m.is_empty()) else {
            filter.exclude(row, "missing metric")?;
            continue;
        };
        if !seen.insert((date, metric.to_string())) {
            filter.exclude(row, "duplicate (date, metric)")?;
            continue;
        }
        records.push(WellBeingRecord {
            date,
            metric: metric.to_string(),
            value: values.get(i).unwrap_or(f64::NAN),
            value_partial: partials.and_then(|p| p.get(i)).filter(|v| !v.is_nan()),
            note: notes
                .and_then(|n| n.get(i))
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        });
    }
    filter.finish(records.len());
    Ok(records)
}

/// Load `volume_data`.
pub fn load_volume(path: &Path, strict: bool) -> Result<Vec<VolumeRecord>, DashError> {
    const DATASET: &str = "volume_data";
    let raw = read_csv_as_strings(path)?;
    require_columns(&raw, DATASET, &volume::REQUIRED)?;
    let df = parse_float_columns(raw, &[volume::ONE_REP_MAX])?;

    let dates = df.column(volume::DATE)?.str()?;
    let values = df.column(volume::ONE_REP_MAX)?.f64()?;

    let mut filter = RowFilter::new(DATASET, strict);
    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(date) = dates.get(i).and_then(parse_date) else {
            filter.exclude(i + 1, "unparseable date")?;
            continue;
        };
        records.push(VolumeRecord {
            date,
            one_rep_max: values.get(i).unwrap_or(f64::NAN),
        });
    }
    filter.finish(records.len());
    Ok(records)
}
