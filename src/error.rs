//! Error types for the iobio library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum IobioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data shape error: {0}")]
    DataShape(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Data shape error: panel {panel} has no column '{column}'")]
    PanelColumn { panel: usize, column: String },

    #[error("Statistical fit error: {0}")]
    StatisticalFit(String),

    #[error("Invalid count value '{value}' at row {row}, column {col}")]
    InvalidCount {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Invalid numeric value '{value}' at row {row}, column {col}")]
    InvalidValue {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid variable type for column '{column}': {reason}")]
    InvalidVariableType { column: String, reason: String },

    #[error("Formula parse error: {0}")]
    FormulaParse(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IobioError {
    /// Attach a panel index to a missing-column error.
    ///
    /// Other errors pass through unchanged.
    pub fn in_panel(self, panel: usize) -> Self {
        match self {
            IobioError::MissingColumn(column) => IobioError::PanelColumn { panel, column },
            other => other,
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, IobioError>;
