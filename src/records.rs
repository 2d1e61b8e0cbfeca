//! Typed rows of the four input datasets.
//!
//! Loaded once at startup and never mutated; every computation works on
//! derived copies.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::DashError;
use crate::schema::taxonomy;

/// One set/session entry of the lift log.
#[derive(Debug, Clone, PartialEq)]
pub struct LiftRecord {
    pub exercise_name: String,
    pub date: NaiveDate,
    pub reps: u32,
    /// Estimated 1RM; NaN when the source cell was empty or unparseable.
    pub one_rep_max: f64,
    pub cummax_one_rep_max: f64,
    pub rolling_90d_max: f64,
}

impl LiftRecord {
    pub fn new(exercise_name: &str, date: NaiveDate, reps: u32, one_rep_max: f64) -> Self {
        Self {
            exercise_name: exercise_name.to_string(),
            date,
            reps,
            one_rep_max,
            cummax_one_rep_max: f64::NAN,
            rolling_90d_max: f64::NAN,
        }
    }
}

impl AsRef<LiftRecord> for LiftRecord {
    fn as_ref(&self) -> &LiftRecord {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    pub exercise_name: String,
    pub anterior_posterior: String,
    pub push_pull_legs: String,
}

/// Exercise name → classification table.
///
/// The classifier emits one row per muscle group, so the same exercise may
/// appear several times; the first row wins.
#[derive(Debug, Clone)]
pub struct ExerciseTaxonomy {
    frame: DataFrame,
}

impl ExerciseTaxonomy {
    /// Keeps the three taxonomy columns of `df`, one row per exercise.
    pub fn from_frame(df: &DataFrame) -> Result<Self, DashError> {
        let frame = df
            .select([
                taxonomy::EXERCISE_NAME,
                taxonomy::ANTERIOR_POSTERIOR,
                taxonomy::PUSH_PULL_LEGS,
            ])?
            .unique_stable(
                Some(&[taxonomy::EXERCISE_NAME.to_string()]),
                UniqueKeepStrategy::First,
                None,
            )?;
        Ok(Self { frame })
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = TaxonomyEntry>,
    ) -> Result<Self, DashError> {
        let entries: Vec<TaxonomyEntry> = entries.into_iter().collect();
        let df = DataFrame::new(vec![
            Column::new(
                taxonomy::EXERCISE_NAME.into(),
                entries.iter().map(|e| e.exercise_name.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                taxonomy::ANTERIOR_POSTERIOR.into(),
                entries.iter().map(|e| e.anterior_posterior.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                taxonomy::PUSH_PULL_LEGS.into(),
                entries.iter().map(|e| e.push_pull_legs.as_str()).collect::<Vec<_>>(),
            ),
        ])?;
        Self::from_frame(&df)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of distinct exercises.
    pub fn len(&self) -> usize {
        self.frame.height()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellBeingRecord {
    pub date: NaiveDate,
    pub metric: String,
    pub value: f64,
    /// Score from the partially-completed questionnaire, when logged.
    pub value_partial: Option<f64>,
    pub note: Option<String>,
}

/// Daily training volume; zero marks a rest day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRecord {
    pub date: NaiveDate,
    pub one_rep_max: f64,
}

/// Exercise name → target 1RM.
pub type GoalTargets = BTreeMap<String, f64>;
