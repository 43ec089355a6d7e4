//! Non-fatal warnings collected while processing a file or batch.
//!
//! Every diagnostic is also forwarded to the `log` facade when it is
//! recorded, so callers can either inspect the collected list or install a
//! logger and watch the stream.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No preamble could be parsed; the legacy column map was used.
    UnverifiedSchema,
    /// Declared and observed column counts disagree.
    ColumnCountMismatch,
    /// A field used by the pipeline has no column in this schema.
    MissingOptionalColumn,
    /// A token line was skipped.
    MalformedRow,
    /// A link or type value did not match its grammar.
    MalformedAnnotation,
    /// Link and type name different chains for the same token.
    LinkTypeConflict,
    /// A token appeared before any sentence marker.
    ImplicitSentence,
    /// A chain had several link candidates in the next file.
    AmbiguousChainConnection,
    /// A chain reaching the end of its file found no continuation.
    UnresolvedChainConnection,
    /// A file was excluded from a batch.
    FileExcluded,
}

/// A single warning with file and line context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Source file name, when known
    pub file: Option<String>,
    /// 1-based source line, when the diagnostic concerns a single line
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            file: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::warning(kind, message)
        }
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(kind, message)
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}: ", file, line)?,
            (Some(file), None) => write!(f, "{}: ", file)?,
            (None, Some(line)) => write!(f, "line {}: ", line)?,
            (None, None) => {}
        }
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Ordered collection of diagnostics for one file.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    file: Option<String>,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Diagnostics tagged with the given file name.
    pub fn for_file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            entries: Vec::new(),
        }
    }

    /// Record a diagnostic, tagging it with this collection's file and
    /// forwarding it to the logger.
    pub fn push(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.file.is_none() {
            diagnostic.file = self.file.clone();
        }
        match diagnostic.severity {
            Severity::Info => log::debug!("[clause-mates] {}", diagnostic),
            Severity::Warning => log::warn!("[clause-mates] {}", diagnostic),
            Severity::Error => log::error!("[clause-mates] {}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Count diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
