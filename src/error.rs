//! Error types for the aggregation pipeline.
//!
//! Internal errors (`StoreError`, `CacheError`, `AggregateError`) are folded
//! into `CoreError` at the scheduler boundary. `from_store` carries the
//! escalation rules: a missing or unreadable season is `DataUnavailable`,
//! content that reads but does not parse or reduce is `ComputeFailure`.

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No shot data available for {year}")]
    DataUnavailable { year: i32 },

    #[error("Year {year} outside supported range {min}-{max}")]
    InvalidYear { year: i32, min: i32, max: i32 },

    #[error("Aggregation failed for {year}: {reason}")]
    ComputeFailure { year: i32, reason: String },

    /// Listing the available seasons failed before any year was aggregated.
    /// Only trend requests and year listing return it; it is a server error.
    #[error("Year discovery failed: {0}")]
    Discovery(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl CoreError {
    /// True for conditions the caller can correct by asking for another year.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::DataUnavailable { .. } | CoreError::InvalidYear { .. }
        )
    }

    pub fn compute(year: i32, reason: impl Into<String>) -> Self {
        CoreError::ComputeFailure {
            year,
            reason: reason.into(),
        }
    }

    pub(crate) fn from_store(year: i32, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => CoreError::DataUnavailable { year },
            StoreError::Io { path, source } => {
                log::warn!("Season {year} unreadable at {path}: {source}");
                CoreError::DataUnavailable { year }
            }
            malformed @ StoreError::Malformed { .. } => CoreError::compute(year, malformed.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Season {year} not found")]
    NotFound { year: i32 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed shot records in {path}: {reason}")]
    Malformed { path: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregateError {
    #[error("Malformed shot at index {index}: {reason}")]
    MalformedInput { index: usize, reason: String },
}
