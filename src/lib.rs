//! Metric computations behind a personal lifting and well-being dashboard.
//!
//! The rendering layer (Python, via the `python` feature) calls the five
//! `Dashboard::compute_*` operations and plots the returned tables.

pub mod binning;
pub mod config;
pub mod error;
pub mod extremum;
pub mod goals;
pub mod join;
pub mod loader;
pub mod logging;
pub mod model;
pub mod preprocess;
pub mod records;
pub mod schema;
pub mod smoothing;
pub mod views;

#[cfg(feature = "python")]
mod bindings;

pub use binning::{BinWidth, CategoryDimension, HeatmapCell, HeatmapGrid, HeatmapMetric};
pub use config::DashboardConfig;
pub use error::DashError;
pub use goals::{GoalProgress, GoalProgressRow};
pub use model::{Dashboard, Dataset};
pub use records::{ExerciseTaxonomy, GoalTargets, LiftRecord, VolumeRecord, WellBeingRecord};
pub use views::{LineMode, OneRepMaxSeries, SmoothedSeries};
