use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown pool scope: {0}")]
    UnknownScope(String),

    #[error("pool '{pool}': field '{field}' is required for scope '{scope}'")]
    MissingQualifier {
        pool: String,
        scope: &'static str,
        field: &'static str,
    },

    #[error("pool '{pool}': field '{field}' is not allowed for scope '{scope}'")]
    ForbiddenQualifier {
        pool: String,
        scope: &'static str,
        field: &'static str,
    },

    #[error("pool '{pool}': repo scope needs exactly one owner (org or user)")]
    AmbiguousOwner { pool: String },

    #[error("invalid secret reference: {0}")]
    InvalidSecret(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
