use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DashError;
use crate::records::GoalTargets;

// ── Config ──────────────────────────────────────────────────────────────────

/// Dashboard configuration. Every key is optional in the JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the four CSV files
    pub data_dir: PathBuf,
    pub weightlifting_file: String,
    pub classifications_file: String,
    pub mental_health_file: String,
    pub volume_file: String,
    /// Trailing window for best-lift highlighting
    pub best_lift_window_days: i64,
    /// Trailing window used when `rolling_90d_max` must be derived
    pub rolling_max_window_days: i64,
    /// Days before 1 January searched for the goal baseline
    pub baseline_lookback_days: i64,
    pub goal_targets: GoalTargets,
    /// Stop on the first malformed row instead of excluding it
    pub strict_rows: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            weightlifting_file: "weightlifting_data.csv".into(),
            classifications_file: "exercise_classifications.csv".into(),
            mental_health_file: "mental_health_data.csv".into(),
            volume_file: "volume_data.csv".into(),
            best_lift_window_days: 30,
            rolling_max_window_days: 90,
            baseline_lookback_days: 365,
            goal_targets: GoalTargets::from([
                ("Bench Press (Barbell)".to_string(), 225.0),
                ("Squat (Barbell)".to_string(), 315.0),
                ("Deadlift (Barbell)".to_string(), 405.0),
                ("Overhead Press (Barbell)".to_string(), 135.0),
            ]),
            strict_rows: false,
        }
    }
}

impl DashboardConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DashError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DashError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg = DashboardConfig::from_json_str(
            r#"{ "data_dir": "/srv/lifts", "goal_targets": { "Hip Thrust (Barbell)": 400 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/lifts"));
        assert_eq!(cfg.best_lift_window_days, 30);
        assert_eq!(cfg.volume_file, "volume_data.csv");
        assert_eq!(cfg.goal_targets.len(), 1);
        assert_eq!(cfg.goal_targets["Hip Thrust (Barbell)"], 400.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            DashboardConfig::from_json_str("{ nope"),
            Err(DashError::Json(_))
        ));
    }
}
