//! Error taxonomy shared by every juris crate.
//!
//! Query failures abort a job run, dispatch failures only affect one
//! recipient, config failures surface lazily on first collaborator use.

use thiserror::Error;

/// Missing or invalid configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// The case store could not answer a read.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store rejected credentials: {0}")]
    Unauthorized(String),

    #[error("store rejected query ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed store response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A single outbound email could not be delivered.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A job run stopped before visiting every recipient.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_into_query_error() {
        let err: QueryError = ConfigError::Missing("SUPABASE_URL").into();
        assert!(matches!(err, QueryError::Config(ConfigError::Missing("SUPABASE_URL"))));
        assert_eq!(err.to_string(), "missing required setting: SUPABASE_URL");
    }

    #[test]
    fn test_job_error_wraps_query_error() {
        let err: JobError = QueryError::Unavailable("connection refused".into()).into();
        assert_eq!(
            err.to_string(),
            "query failed: store unavailable: connection refused"
        );
    }
}
