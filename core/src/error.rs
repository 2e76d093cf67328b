use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate {entity} for key ({key})")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("Invalid {field} for guild '{guild}': {value}")]
    InvalidLevel {
        guild: String,
        field: &'static str,
        value: i64,
    },

    #[error("Invalid timestamp '{raw}': {reason}")]
    InvalidTimestamp { raw: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatsError {
    /// Duplicates are absorbed as no-ops by the collection cycle; every
    /// other variant counts as a real failure.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

pub type StatsResult<T> = Result<T, StatsError>;
