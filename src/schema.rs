/// Column-name constants for the dashboard tables.
/// Single source of truth - exported to Python via PyO3.

// ── Lift records ────────────────────────────────────────────────────────────
pub mod lifts {
    pub const EXERCISE_NAME: &str = "exercise_name";
    pub const DATE: &str = "date";
    pub const REPS: &str = "reps";
    pub const ONE_REP_MAX: &str = "one_rep_max";
    /// Raw set weight, only read when `one_rep_max` is absent.
    pub const WEIGHT: &str = "weight";
    /// Lifter body mass on the day, used with `weight` for bodyweight movements.
    pub const BODY_MASS: &str = "body_mass";
    pub const CUMMAX_ONE_REP_MAX: &str = "cummax_one_rep_max";
    pub const ROLLING_90D_MAX: &str = "rolling_90d_max";
    pub const BEST_LIFT: &str = "best_lift";
    pub const LINE_VALUE: &str = "line_value";

    pub const REQUIRED: [&str; 3] = [EXERCISE_NAME, DATE, REPS];
}

// ── Exercise taxonomy ───────────────────────────────────────────────────────
pub mod taxonomy {
    pub const EXERCISE_NAME: &str = "exercise_name";
    pub const ANTERIOR_POSTERIOR: &str = "Anterior_Posterior";
    pub const PUSH_PULL_LEGS: &str = "Push_Pull_Legs";

    pub const REQUIRED: [&str; 3] = [EXERCISE_NAME, ANTERIOR_POSTERIOR, PUSH_PULL_LEGS];
}

// ── Well-being observations ─────────────────────────────────────────────────
pub mod well_being {
    pub const DATE: &str = "date";
    pub const METRIC: &str = "metric";
    pub const VALUE: &str = "value";
    pub const NOTE: &str = "note";
    /// Optional partial-questionnaire score.
    pub const VALUE_PARTIAL: &str = "value_partial";

    pub const REQUIRED: [&str; 3] = [DATE, METRIC, VALUE];
}

// ── Daily volume ────────────────────────────────────────────────────────────
pub mod volume {
    pub const DATE: &str = "date";
    pub const ONE_REP_MAX: &str = "one_rep_max";

    pub const REQUIRED: [&str; 2] = [DATE, ONE_REP_MAX];
}

// ── Heatmap cells ───────────────────────────────────────────────────────────
pub mod heatmap {
    pub const TIME_BIN: &str = "time_bin";
    pub const CATEGORY_VALUE: &str = "category_value";
    pub const FREQUENCY: &str = "Frequency";
    pub const VOLUME: &str = "Volume";
    pub const BUCKET: &str = "bucket";
}

// ── Smoothed series ─────────────────────────────────────────────────────────
pub mod smoothed {
    pub const DATE: &str = "date";
    pub const METRIC: &str = "metric";
    pub const VALUE: &str = "value";
    pub const VALUE_PARTIAL: &str = "value_partial";
    pub const SMOOTHED: &str = "smoothed";
}

// ── Goal progress ───────────────────────────────────────────────────────────
pub mod goal {
    pub const EXERCISE_NAME: &str = "exercise_name";
    pub const DATE: &str = "date";
    pub const ONE_REP_MAX: &str = "one_rep_max";
    pub const CUMMAX_ONE_REP_MAX: &str = "cummax_one_rep_max";
    pub const BASELINE: &str = "baseline";
    pub const TARGET: &str = "target";
    pub const PROGRESS: &str = "progress";
}
