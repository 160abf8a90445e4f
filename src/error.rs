#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unparseable selection payload. Callers at the selection boundary
    /// recover from this by ignoring the fragment.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unknown filter type: {0}")]
    UnknownFilterType(String),

    #[error("unknown time preset: {0}")]
    UnknownPreset(String),

    #[error("invalid value for {typ}: {reason}")]
    InvalidFilterValue { typ: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_sqlite::InteractError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures caused by a persisted or submitted filter that can no
    /// longer be reconstructed.
    pub fn is_reconstruction_failure(&self) -> bool {
        matches!(
            self,
            AppError::UnknownFilterType(_)
                | AppError::UnknownPreset(_)
                | AppError::InvalidFilterValue { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruction_failures() {
        assert!(AppError::UnknownFilterType("X".into()).is_reconstruction_failure());
        assert!(AppError::UnknownPreset("2w".into()).is_reconstruction_failure());
        assert!(AppError::InvalidFilterValue {
            typ: "PathFilter".into(),
            reason: "expected a string".into(),
        }
        .is_reconstruction_failure());
        assert!(!AppError::MalformedInput("{".into()).is_reconstruction_failure());
        assert!(!AppError::Internal("boom".into()).is_reconstruction_failure());
    }

    #[test]
    fn test_display() {
        let e = AppError::InvalidFilterValue {
            typ: "NumQueriesFilter".into(),
            reason: "not a number".into(),
        };
        assert_eq!(e.to_string(), "invalid value for NumQueriesFilter: not a number");
    }
}
