use thiserror::Error;

/// Unified error type for the envschema workspace.
///
/// Resolution itself never fails; these cover everything around it.
#[derive(Error, Debug)]
pub enum EnvschemaError {
    // ── Schema errors ──────────────────────────────────────────
    #[error("invalid schema at `{path}`: {reason}")]
    Schema { path: String, reason: String },

    // ── Environment errors ─────────────────────────────────────
    #[error("env file error: {path}: {reason}")]
    EnvFile { path: String, reason: String },

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("unresolved variables with no default: {}", .0.join(", "))]
    Unresolved(Vec<String>),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl EnvschemaError {
    /// Shorthand for a schema error at a dotted path.
    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnvschemaError>;
