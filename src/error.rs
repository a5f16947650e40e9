use thiserror::Error;

/// Errors raised while serving a burnout analysis or one of the read endpoints.
#[derive(Debug, Error)]
pub enum AppError {
    /// A user or their assignments do not exist in the store.
    #[error("{0}")]
    NotFound(String),

    /// The requested view is not one of Day, Week or Month.
    #[error("Invalid view kind: {0}")]
    InvalidViewKind(String),

    /// The request body or one of its fields could not be understood.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing store could not be reached or rejected the query.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The text-generation service failed or returned nothing usable.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status code the error is surfaced with.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::InvalidViewKind(_) | AppError::Validation(_) => 400,
            AppError::Database(_) | AppError::Llm(_) | AppError::Config(_) => 500,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Validation(format!("Date parse error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Llm(format!("HTTP error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(AppError::NotFound("No assignments found".into()).status_code(), 404);
        assert_eq!(AppError::InvalidViewKind("Year".into()).status_code(), 400);
        assert_eq!(AppError::Validation("bad".into()).status_code(), 400);
        assert_eq!(AppError::Llm("down".into()).status_code(), 500);
        assert_eq!(AppError::Database(sqlx::Error::PoolTimedOut).status_code(), 500);
    }

    #[test]
    fn not_found_message_is_bare() {
        let err = AppError::NotFound("User not found".into());
        assert_eq!(err.to_string(), "User not found");
    }
}
