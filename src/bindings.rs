use std::collections::{HashMap, HashSet};

use chrono::Datelike;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::config::DashboardConfig;
use crate::model::Dashboard;
use crate::records::GoalTargets;
use crate::schema;

#[pyclass(name = "Dashboard", frozen)]
pub struct PyDashboard {
    inner: Dashboard,
}

#[pymethods]
impl PyDashboard {
    /// Load the four CSV files from `data_dir`.
    ///
    /// `config_path` points at an optional JSON config; its `data_dir` is
    /// overridden by the argument.
    #[new]
    #[pyo3(signature = (data_dir, config_path=None))]
    fn new(data_dir: String, config_path: Option<String>) -> PyResult<Self> {
        let mut config = match config_path {
            Some(path) => DashboardConfig::from_json_file(path)?,
            None => DashboardConfig::default(),
        };
        config.data_dir = data_dir.into();
        Ok(Self {
            inner: Dashboard::load(config)?,
        })
    }

    #[pyo3(signature = (exercise_names, line_mode="rolling", highlight_best=true, show_single_rep=true))]
    fn compute_1rm_series(
        &self,
        exercise_names: HashSet<String>,
        line_mode: &str,
        highlight_best: bool,
        show_single_rep: bool,
    ) -> PyResult<PyDataFrame> {
        let series = self.inner.compute_1rm_series(
            &exercise_names,
            line_mode.parse()?,
            highlight_best,
            show_single_rep,
        );
        Ok(PyDataFrame(series.to_frame()?))
    }

    /// Returns the cell table and the category axis, most frequent first.
    #[pyo3(signature = (metric="Frequency", category="exercise", bin_width="2mo"))]
    fn compute_volume_heatmap(
        &self,
        metric: &str,
        category: &str,
        bin_width: &str,
    ) -> PyResult<(PyDataFrame, Vec<String>)> {
        let grid =
            self.inner
                .compute_volume_heatmap(metric.parse()?, category.parse()?, bin_width.parse()?)?;
        Ok((PyDataFrame(grid.to_frame()?), grid.categories))
    }

    #[pyo3(signature = (decay_rate=0.1, exclude_zero_days=true))]
    fn compute_volume_over_time(
        &self,
        decay_rate: f64,
        exclude_zero_days: bool,
    ) -> PyResult<PyDataFrame> {
        let series = self
            .inner
            .compute_volume_over_time(decay_rate, exclude_zero_days)?;
        Ok(PyDataFrame(series.to_frame()?))
    }

    #[pyo3(signature = (metrics, decay_rate=0.1))]
    fn compute_mental_health_series(
        &self,
        metrics: Vec<String>,
        decay_rate: f64,
    ) -> PyResult<PyDataFrame> {
        let series = self
            .inner
            .compute_mental_health_series(&metrics, decay_rate)?;
        Ok(PyDataFrame(series.to_frame()?))
    }

    /// Returns the progress table and the exercises excluded for lack of a
    /// baseline. Defaults: configured targets, current calendar year.
    #[pyo3(signature = (goal_targets=None, year=None))]
    fn compute_goal_progress(
        &self,
        goal_targets: Option<HashMap<String, f64>>,
        year: Option<i32>,
    ) -> PyResult<(PyDataFrame, Vec<String>)> {
        let targets: Option<GoalTargets> = goal_targets.map(|t| t.into_iter().collect());
        let year = year.unwrap_or_else(|| chrono::Local::now().year());
        let progress = self.inner.compute_goal_progress(targets.as_ref(), year);
        Ok((PyDataFrame(progress.to_frame()?), progress.excluded))
    }

    fn exercise_names(&self) -> Vec<String> {
        self.inner.exercise_names()
    }

    fn metric_names(&self) -> Vec<String> {
        self.inner.metric_names()
    }
}

/// Install the tracing subscriber; `RUST_LOG` takes precedence.
#[pyfunction]
#[pyo3(signature = (filter="info"))]
fn init_logging(filter: &str) -> bool {
    crate::logging::init_logging(filter)
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Lifts
    let lifts = PyModule::new(m.py(), "lifts")?;
    lifts.add("EXERCISE_NAME", schema::lifts::EXERCISE_NAME)?;
    lifts.add("DATE", schema::lifts::DATE)?;
    lifts.add("REPS", schema::lifts::REPS)?;
    lifts.add("ONE_REP_MAX", schema::lifts::ONE_REP_MAX)?;
    lifts.add("CUMMAX_ONE_REP_MAX", schema::lifts::CUMMAX_ONE_REP_MAX)?;
    lifts.add("ROLLING_90D_MAX", schema::lifts::ROLLING_90D_MAX)?;
    lifts.add("BEST_LIFT", schema::lifts::BEST_LIFT)?;
    lifts.add("LINE_VALUE", schema::lifts::LINE_VALUE)?;
    m.add_submodule(&lifts)?;

    // Heatmap
    let heatmap = PyModule::new(m.py(), "heatmap")?;
    heatmap.add("TIME_BIN", schema::heatmap::TIME_BIN)?;
    heatmap.add("CATEGORY_VALUE", schema::heatmap::CATEGORY_VALUE)?;
    heatmap.add("FREQUENCY", schema::heatmap::FREQUENCY)?;
    heatmap.add("VOLUME", schema::heatmap::VOLUME)?;
    heatmap.add("BUCKET", schema::heatmap::BUCKET)?;
    m.add_submodule(&heatmap)?;

    // Smoothed series
    let smoothed = PyModule::new(m.py(), "smoothed")?;
    smoothed.add("DATE", schema::smoothed::DATE)?;
    smoothed.add("METRIC", schema::smoothed::METRIC)?;
    smoothed.add("VALUE", schema::smoothed::VALUE)?;
    smoothed.add("VALUE_PARTIAL", schema::smoothed::VALUE_PARTIAL)?;
    smoothed.add("SMOOTHED", schema::smoothed::SMOOTHED)?;
    m.add_submodule(&smoothed)?;

    // Goal progress
    let goal = PyModule::new(m.py(), "goal")?;
    goal.add("EXERCISE_NAME", schema::goal::EXERCISE_NAME)?;
    goal.add("DATE", schema::goal::DATE)?;
    goal.add("ONE_REP_MAX", schema::goal::ONE_REP_MAX)?;
    goal.add("CUMMAX_ONE_REP_MAX", schema::goal::CUMMAX_ONE_REP_MAX)?;
    goal.add("BASELINE", schema::goal::BASELINE)?;
    goal.add("TARGET", schema::goal::TARGET)?;
    goal.add("PROGRESS", schema::goal::PROGRESS)?;
    m.add_submodule(&goal)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDashboard>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    add_schema_exports(m)?;
    Ok(())
}
