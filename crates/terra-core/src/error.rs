use thiserror::Error;

/// Coarse classification of an [`AppError`].
///
/// Callers that only need to distinguish "the upstream data source failed"
/// from "the record does not exist" from everything else match on this
/// instead of on the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A source adapter could not deliver its document.
    UpstreamUnavailable,
    /// A lookup or delete targeted a country that is not stored.
    NotFound,
    /// Storage, serialization, configuration or any other failure.
    Unexpected,
}

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur in Terra.
/// It uses the `thiserror` crate for ergonomic error handling and automatic conversion
/// from underlying library errors.
///
/// # Error Conversion
///
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
///
/// # Examples
///
/// ```
/// use terra_core::error::{AppError, ErrorKind};
///
/// let err = AppError::ExternalSourceUnavailable {
///     source_name: "countries".to_string(),
///     reason: "HTTP 503".to_string(),
/// };
/// assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// This error wraps all errors from SQLx database operations, including
    /// connection failures, query errors, and constraint violations.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// An external data source could not be fetched or parsed.
    ///
    /// Raised for network errors, timeouts, non-success HTTP statuses and
    /// bodies that do not have the expected shape. Never retried internally.
    #[error("External data source unavailable ({source_name}): {reason}")]
    ExternalSourceUnavailable { source_name: String, reason: String },

    /// No stored country matches the requested name.
    #[error("Country not found: {0}")]
    CountryNotFound(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    ///
    /// This error occurs when a configured source URL cannot be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The HTTP client itself could not be constructed.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// Generic application error for cases not covered by specific variants.
    ///
    /// Use this sparingly - prefer creating specific error variants
    /// for better error handling and debugging.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Builds an `ExternalSourceUnavailable` for the named source.
    pub fn source_unavailable(source_name: &str, reason: impl Into<String>) -> Self {
        AppError::ExternalSourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ExternalSourceUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            AppError::CountryNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") {
                    "Cannot connect to database. Is PostgreSQL running?\n   Check DATABASE_URL."
                        .to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::ExternalSourceUnavailable {
                source_name,
                reason,
            } => {
                format!(
                    "External data source unavailable: could not fetch {} ({})\n   Nothing was written. Try again later.",
                    source_name, reason
                )
            }
            AppError::CountryNotFound(name) => format!("Country not found: {}", name),
            AppError::InvalidUrl(url) => {
                format!(
                    "Invalid source URL: {}\n   Example: https://open.er-api.com/v6/latest/USD",
                    url
                )
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::CountryNotFound("Atlantis".to_string());
        assert_eq!(err.to_string(), "Country not found: Atlantis");
    }

    #[test]
    fn test_generic_error() {
        let err = AppError::Generic("Something went wrong".to_string());
        assert_eq!(err.to_string(), "Error: Something went wrong");
    }

    #[test]
    fn test_source_unavailable_display() {
        let err = AppError::source_unavailable("exchange rates", "HTTP 502");
        assert_eq!(
            err.to_string(),
            "External data source unavailable (exchange rates): HTTP 502"
        );
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            AppError::source_unavailable("countries", "timeout").kind(),
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(
            AppError::CountryNotFound("x".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Unexpected
        );
        assert_eq!(
            AppError::ConfigError("bad".to_string()).kind(),
            ErrorKind::Unexpected
        );
    }

    #[test]
    fn test_error_from_serde() {
        let json = "{ invalid json }";
        let result: Result<serde_json::Value, _> = serde_json::from_str(json);
        let serde_err = result.unwrap_err();
        let app_err: AppError = serde_err.into();
        assert!(matches!(app_err, AppError::SerializationError(_)));
        assert_eq!(app_err.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_user_message_source_unavailable() {
        let err = AppError::source_unavailable("countries", "connection refused");
        let msg = err.user_message();
        assert!(msg.contains("could not fetch countries"));
        assert!(msg.contains("Nothing was written"));
    }

    #[test]
    fn test_user_message_database_connection() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        let msg = err.user_message();
        assert!(msg.contains("Cannot connect to database") || msg.contains("Database error"));
    }
}
