use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::binning::{BinWidth, CategoryDimension, HeatmapGrid, HeatmapMetric};
use crate::config::DashboardConfig;
use crate::error::DashError;
use crate::goals::{self, GoalProgress};
use crate::join::{join_taxonomy, ClassifiedLift};
use crate::loader;
use crate::preprocess;
use crate::records::{ExerciseTaxonomy, GoalTargets, LiftRecord, VolumeRecord, WellBeingRecord};
use crate::views::{self, LineMode, OneRepMaxSeries, SmoothedSeries};

/// Base datasets, loaded once and only ever read.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Lift log left-joined with the exercise taxonomy.
    pub lifts: Vec<ClassifiedLift>,
    pub well_being: Vec<WellBeingRecord>,
    pub volume: Vec<VolumeRecord>,
}

impl Dataset {
    pub fn new(
        lifts: &[LiftRecord],
        taxonomy: &ExerciseTaxonomy,
        well_being: Vec<WellBeingRecord>,
        volume: Vec<VolumeRecord>,
    ) -> Result<Self, DashError> {
        Ok(Self {
            lifts: join_taxonomy(lifts, taxonomy)?,
            well_being,
            volume,
        })
    }

    /// Read all four files named by `config`. A missing volume file is
    /// replaced by volume derived from the lift log.
    pub fn load(config: &DashboardConfig) -> Result<Self, DashError> {
        let strict = config.strict_rows;
        let lifts = loader::load_lifts(
            &config.path_of(&config.weightlifting_file),
            config.rolling_max_window_days,
            strict,
        )?;
        let taxonomy = loader::load_taxonomy(&config.path_of(&config.classifications_file), strict)?;
        let well_being =
            loader::load_well_being(&config.path_of(&config.mental_health_file), strict)?;

        let volume_path = config.path_of(&config.volume_file);
        let volume = if volume_path.exists() {
            loader::load_volume(&volume_path, strict)?
        } else {
            info!(path = %volume_path.display(), "no volume file, deriving daily volume from lifts");
            preprocess::derive_volume(&lifts)
        };

        let data = Self::new(&lifts, &taxonomy, well_being, volume)?;
        let unmatched = data
            .lifts
            .iter()
            .filter(|c| c.push_pull_legs.is_none())
            .count();
        if unmatched > 0 {
            info!(rows = unmatched, "lift rows without a taxonomy entry");
        }
        Ok(data)
    }
}

/// Entry point for the rendering layer.
///
/// Every `compute_*` call starts from the shared base data and builds its
/// own result; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashboardConfig,
    data: Arc<Dataset>,
}

impl Dashboard {
    pub fn load(config: DashboardConfig) -> Result<Self, DashError> {
        let data = Dataset::load(&config)?;
        Ok(Self::from_dataset(config, data))
    }

    pub fn from_dataset(config: DashboardConfig, data: Dataset) -> Self {
        Self {
            config,
            data: Arc::new(data),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    pub fn compute_1rm_series(
        &self,
        exercise_names: &HashSet<String>,
        line_mode: LineMode,
        highlight_best: bool,
        show_single_rep: bool,
    ) -> OneRepMaxSeries {
        debug!(
            exercises = exercise_names.len(),
            ?line_mode,
            highlight_best,
            show_single_rep,
            "computing 1RM series"
        );
        views::one_rep_max_series(
            &self.data.lifts,
            exercise_names,
            line_mode,
            highlight_best,
            show_single_rep,
            self.config.best_lift_window_days,
        )
    }

    pub fn compute_volume_heatmap(
        &self,
        metric: HeatmapMetric,
        category: CategoryDimension,
        bin_width: BinWidth,
    ) -> Result<HeatmapGrid, DashError> {
        debug!(%metric, ?category, ?bin_width, "computing volume heatmap");
        views::volume_heatmap(&self.data.lifts, metric, category, bin_width)
    }

    pub fn compute_volume_over_time(
        &self,
        decay_rate: f64,
        exclude_zero_days: bool,
    ) -> Result<SmoothedSeries, DashError> {
        debug!(decay_rate, exclude_zero_days, "computing volume over time");
        views::volume_over_time(&self.data.volume, decay_rate, exclude_zero_days)
    }

    pub fn compute_mental_health_series(
        &self,
        metrics: &[String],
        decay_rate: f64,
    ) -> Result<SmoothedSeries, DashError> {
        debug!(?metrics, decay_rate, "computing mental health series");
        views::mental_health_series(&self.data.well_being, metrics, decay_rate)
    }

    /// Progress for `year`; `targets = None` uses the configured goals.
    pub fn compute_goal_progress(&self, targets: Option<&GoalTargets>, year: i32) -> GoalProgress {
        let targets = targets.unwrap_or(&self.config.goal_targets);
        debug!(goals = targets.len(), year, "computing goal progress");
        goals::goal_progress(
            &self.data.lifts,
            targets,
            year,
            self.config.baseline_lookback_days,
        )
    }

    /// Distinct exercise names, most logged first.
    pub fn exercise_names(&self) -> Vec<String> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for (name, positions) in crate::extremum::group_positions(
            self.data.lifts.iter().map(|c| c.lift.exercise_name.as_str()),
        ) {
            counts.push((name, positions.len()));
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().map(|(n, _)| n.to_string()).collect()
    }

    /// Distinct well-being metric names, sorted.
    pub fn metric_names(&self) -> Vec<String> {
        let names: std::collections::BTreeSet<&str> =
            self.data.well_being.iter().map(|r| r.metric.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_fixture(dir: &std::path::Path) {
        fs::write(
            dir.join("weightlifting_data.csv"),
            "exercise_name,date,reps,one_rep_max,cummax_one_rep_max,rolling_90d_max\n\
             Squat (Barbell),2022-12-10,5,250,250,250\n\
             Squat (Barbell),2023-01-15,5,265,265,265\n\
             Bench Press (Barbell),2023-01-15,1,200,200,200\n\
             Cable Fly,2023-02-01,12,60,60,60\n",
        )
        .unwrap();
        fs::write(
            dir.join("exercise_classifications.csv"),
            "exercise_name,Anterior_Posterior,Push_Pull_Legs\n\
             Squat (Barbell),anterior,legs\n\
             Bench Press (Barbell),anterior,push\n",
        )
        .unwrap();
        fs::write(
            dir.join("mental_health_data.csv"),
            "date,metric,value,note\n\
             2023-01-01,mood,10,\n\
             2023-01-02,mood,30,\n",
        )
        .unwrap();
    }

    #[test]
    fn loads_and_computes_every_view() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let dashboard = Dashboard::load(DashboardConfig::with_data_dir(dir.path())).unwrap();

        assert_eq!(dashboard.dataset().lifts.len(), 4);
        assert_eq!(dashboard.dataset().lifts[3].push_pull_legs, None);
        // derived volume spans 2022-12-10 ..= 2023-02-01
        assert_eq!(dashboard.dataset().volume.len(), 54);
        assert_eq!(dashboard.exercise_names()[0], "Squat (Barbell)");
        assert_eq!(dashboard.metric_names(), vec!["mood".to_string()]);

        let squat = HashSet::from(["Squat (Barbell)".to_string()]);
        let series = dashboard.compute_1rm_series(&squat, LineMode::Cummax, true, true);
        assert_eq!(series.rows.len(), 2);

        let grid = dashboard
            .compute_volume_heatmap(
                HeatmapMetric::Frequency,
                CategoryDimension::Pattern,
                BinWidth::TwoMonths,
            )
            .unwrap();
        assert_eq!(grid.categories, vec!["legs".to_string(), "push".to_string()]);
        assert_eq!(grid.to_frame().unwrap().height(), 2);

        let volume = dashboard.compute_volume_over_time(0.1, true).unwrap();
        assert_eq!(volume.rows.len(), 3);

        let mood = dashboard
            .compute_mental_health_series(&["mood".to_string()], 0.0)
            .unwrap();
        assert!(mood.rows.iter().all(|r| r.smoothed == 20.0));

        let goals = dashboard.compute_goal_progress(None, 2023);
        assert_eq!(goals.rows.len(), 2);
        assert_eq!(goals.rows[0].progress, 0.0);
        assert!((goals.rows[1].progress - 15.0 / 65.0).abs() < 1e-12);
        assert_eq!(goals.excluded.len(), 3);
        assert_eq!(goals.to_frame().unwrap().height(), 2);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Dashboard::load(DashboardConfig::with_data_dir(dir.path())).is_err());
    }
}
