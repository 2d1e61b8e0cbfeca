use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Missing column '{column}' in {dataset}")]
    MissingColumn { dataset: String, column: String },

    #[error("Invalid row {row} in {dataset}: {reason}")]
    InvalidRow {
        dataset: String,
        row: usize,
        reason: String,
    },

    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashError {
    pub(crate) fn invalid_parameter(name: &str, value: impl ToString) -> Self {
        DashError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(feature = "python")]
impl From<DashError> for pyo3::PyErr {
    fn from(err: DashError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};
        match err {
            DashError::InvalidParameter { .. } => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}
