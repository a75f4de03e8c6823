use std::path::PathBuf;

use thiserror::Error;

/// Closed set of pipeline failures.
///
/// Every stage names its failure kind instead of stringifying early, so the
/// binary can map each kind to a stable exit code and callers can match on
/// what actually went wrong.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// The dataset path does not resolve to a readable file.
    #[error("The file '{}' was not found. Please check the file path.", path.display())]
    DatasetNotFound { path: PathBuf },

    /// The dataset is missing one of the columns the pipeline reads.
    #[error("A required column is missing: `{name}`. Please ensure the dataset has the necessary columns.")]
    MissingColumn { name: String },

    /// The dataset could not be read as CSV at all (bad header, broken stream).
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    /// A non-empty date cell survived to cleaning but matches no accepted format.
    #[error("Invalid date '{value}' for {entity}. Accepted formats: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD.")]
    InvalidDate { entity: String, value: String },

    /// Cleaning removed every row, so there is nothing to analyze or chart.
    #[error("No rows remain for the selected countries ({}). Check the spelling of the country names.", entities.join(", "))]
    EmptySelection { entities: Vec<String> },

    /// A chart failed to render. No partial chart file is written.
    #[error("Failed to render chart '{chart}': {message}")]
    ChartRender { chart: String, message: String },

    /// An export target could not be written.
    #[error("Failed to write '{}': {message}", path.display())]
    ExportFailed { path: PathBuf, message: String },

    /// Catch-all for failures outside the mapped stages.
    #[error("An unexpected error occurred: {message}")]
    Unexpected { message: String },
}

impl AppError {
    /// Process exit code for this failure.
    ///
    /// 2 = input/schema problems, 3 = the data itself is unusable,
    /// 4 = output (chart/export) problems, 1 = everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::DatasetNotFound { .. }
            | AppError::MissingColumn { .. }
            | AppError::MalformedInput { .. } => 2,
            AppError::InvalidDate { .. } | AppError::EmptySelection { .. } => 3,
            AppError::ChartRender { .. } | AppError::ExportFailed { .. } => 4,
            AppError::Unexpected { .. } => 1,
        }
    }
}
