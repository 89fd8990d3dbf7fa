use thiserror::Error;

/// Fatal setup errors. Per-row faults never surface here; they are flags on
/// the record plus a [`crate::diagnostics::Diagnostic`].
#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (duplicate name field, bad export, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Missing required column in a row source.
    #[error("{source_name}: missing column '{column}'")]
    MissingColumn { source_name: String, column: String },

    /// Catalog index input is missing, unreadable, or inconsistent.
    #[error("catalog index '{kind}': {reason}")]
    CatalogIndex { kind: String, reason: String },

    /// Catalog index could not be fetched.
    #[error("catalog fetch failed: {0}")]
    Connectivity(String),

    /// IO error (file read, CSV decode, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl ReconError {
    pub(crate) fn catalog(kind: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::CatalogIndex {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}
