use crate::models::Month;

#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("End month {end} precedes baseline month {baseline}")]
    InvalidRange { baseline: Month, end: Month },

    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl TrendError {
    /// True for errors caused by user input rather than the data source.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TrendError::InvalidRange { .. }
                | TrendError::InvalidMonth(_)
                | TrendError::InvalidArgument(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;
