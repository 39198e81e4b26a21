use thiserror::Error;

/// Errors from chat session operations performed on behalf of a user.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat not found")]
    NotFound,

    #[error("chat belongs to another user")]
    Forbidden,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound,
            RepositoryError::Validation(msg) => ChatError::Validation(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

/// Errors from repository operations (used by trait definitions in mindforge-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_from_repository() {
        assert!(matches!(ChatError::from(RepositoryError::NotFound), ChatError::NotFound));
        assert!(matches!(
            ChatError::from(RepositoryError::Validation("x".into())),
            ChatError::Validation(_)
        ));
        assert!(matches!(
            ChatError::from(RepositoryError::Connection),
            ChatError::Storage(_)
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = RepositoryError::Validation("too long".to_string());
        assert_eq!(err.to_string(), "validation error: too long");
    }
}
