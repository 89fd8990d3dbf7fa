//! Per-row findings collected during a run.
//!
//! Every diagnostic is kept for the result and echoed through `tracing` so a
//! CLI run shows progress on stderr while tests inspect the collected list.

use serde::Serialize;

use crate::model::{RecordKind, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Fault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    // Structural faults
    MissingId,
    DuplicateId,
    MissingParent,
    UnknownParent,
    // Value faults
    MissingTitle,
    Redacted,
    InvalidDate,
    LegacyDate,
    AmbiguousFile,
    // Warnings / info
    DateNotApplicable,
    UnknownType,
    NameKeyMismatch,
    NameKeyConflict,
    FileRenamed,
    ViewDiscarded,
}

impl Code {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingId
            | Self::DuplicateId
            | Self::MissingParent
            | Self::UnknownParent
            | Self::MissingTitle
            | Self::Redacted
            | Self::InvalidDate
            | Self::LegacyDate
            | Self::AmbiguousFile => Severity::Fault,
            Self::DateNotApplicable
            | Self::UnknownType
            | Self::NameKeyMismatch
            | Self::NameKeyConflict
            | Self::ViewDiscarded => Severity::Warning,
            Self::FileRenamed => Severity::Info,
        }
    }
}

/// Where a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub source: String,
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl Location {
    pub fn row(kind: RecordKind, row: &Row) -> Self {
        Self {
            source: row.source.clone(),
            line: row.source_line,
            kind: Some(kind),
            record_id: (!row.id.is_empty()).then(|| row.id.clone()),
        }
    }

    pub fn line(source: &str, line: u64) -> Self {
        Self {
            source: source.to_string(),
            line,
            kind: None,
            record_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Code,
    #[serde(flatten)]
    pub location: Location,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: ", self.location.source, self.location.line)?;
        if let (Some(kind), Some(id)) = (&self.location.kind, &self.location.record_id) {
            write!(f, "{kind} [{id}]: ")?;
        }
        f.write_str(&self.message)
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: Code, location: Location, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            severity: code.severity(),
            code,
            location,
            message: message.into(),
        };
        match diagnostic.severity {
            Severity::Fault => tracing::error!(code = ?code, "{diagnostic}"),
            Severity::Warning => tracing::warn!(code = ?code, "{diagnostic}"),
            Severity::Info => tracing::info!(code = ?code, "{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn count(&self, code: Code) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
