//! Recoverable diagnostics and fatal errors.
//!
//! Resolution and classification degrade instead of aborting: anything that
//! can be skipped is skipped and recorded here, so callers can surface (or
//! assert on) the records however they like. Only unreadable primary input, an
//! unknown target language, or a failed output write abort a run.

use std::fmt;
use std::io;

use thiserror::Error;

/// A recoverable issue recorded while resolving or classifying declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub decl: String,
    pub field: Option<String>,
    pub kind: DiagKind,
}

impl Diagnostic {
    pub fn decl(decl: impl Into<String>, kind: DiagKind) -> Self {
        Self {
            decl: decl.into(),
            field: None,
            kind,
        }
    }

    pub fn field(decl: impl Into<String>, field: impl Into<String>, kind: DiagKind) -> Self {
        Self {
            decl: decl.into(),
            field: Some(field.into()),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}: {}", self.decl, field, self.kind),
            None => write!(f, "{}: {}", self.decl, self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagKind {
    #[error("unsupported construct: {0}")]
    Unsupported(String),
    #[error("embedded type `{0}` not found")]
    UnresolvedEmbedding(String),
    #[error("module `{0}` not available for embedded type lookup")]
    UnknownModule(String),
    #[error("embedded type `{0}` is not a struct")]
    NonStructEmbedding(String),
    #[error("embedding cycle through `{0}`")]
    EmbeddingCycle(String),
    #[error("duplicate field `{0}`; first occurrence kept")]
    DuplicateField(String),
    #[error("override optionality flag `{0}` is not a bool; treated as false")]
    MalformedOverride(String),
}

/// Fatal failures: these abort the run with no output guarantee.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to parse declarations in {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("unknown target language `{0}` (expected one of: flow, ts, elm)")]
    UnknownLang(String),
    #[error("write failed: {0}")]
    Write(#[from] io::Error),
}
