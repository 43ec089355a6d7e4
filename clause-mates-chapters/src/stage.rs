//! Per-chapter processing state.

use clause_mates::{
    ClauseMateError, ClauseMatePipeline, Diagnostic, DiagnosticKind, Diagnostics, FileAnalysis,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// How far a chapter file has progressed.
///
/// ```text
/// Discovered → FormatDetected → Parsed → Extracted → Unified
///      └──────────────┴────────────┴─→ Excluded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
    Discovered,
    FormatDetected,
    Parsed,
    Extracted,
    Unified,
    Excluded,
}

impl FileStage {
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded)
    }
}

/// A file left out of unification, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedFile {
    pub index: usize,
    pub source: String,
    /// Stage the file had reached when it failed
    pub failed_at: FileStage,
    pub reason: String,
}

#[derive(Debug)]
enum Input {
    Path(PathBuf),
    Text(String),
}

/// One chapter in a batch, in reading order.
#[derive(Debug)]
pub struct ChapterFile {
    /// Position in the batch
    pub index: usize,
    pub source: String,
    stage: FileStage,
    input: Input,
    analysis: Option<FileAnalysis>,
    excluded: Option<ExcludedFile>,
}

impl ChapterFile {
    pub fn from_path(index: usize, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(index, path.display().to_string(), Input::Path(path))
    }

    /// A chapter whose content is already in memory.
    pub fn from_text(index: usize, source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(index, source.into(), Input::Text(content.into()))
    }

    fn new(index: usize, source: String, input: Input) -> Self {
        Self {
            index,
            source,
            stage: FileStage::Discovered,
            input,
            analysis: None,
            excluded: None,
        }
    }

    pub fn stage(&self) -> FileStage {
        self.stage
    }

    pub fn analysis(&self) -> Option<&FileAnalysis> {
        self.analysis.as_ref()
    }

    pub fn excluded(&self) -> Option<&ExcludedFile> {
        self.excluded.as_ref()
    }

    /// Run the per-file stages. Failures move the file to `Excluded` instead
    /// of propagating.
    pub fn process(&mut self, pipeline: &ClauseMatePipeline) {
        if self.stage != FileStage::Discovered {
            return;
        }
        if let Err(err) = self.advance(pipeline) {
            self.exclude(err.to_string());
        }
    }

    fn advance(&mut self, pipeline: &ClauseMatePipeline) -> Result<(), ClauseMateError> {
        let content = match &self.input {
            Input::Path(path) => fs::read_to_string(path).map_err(|source| ClauseMateError::Io {
                path: self.source.clone(),
                source,
            })?,
            Input::Text(content) => content.clone(),
        };

        let mut diagnostics = Diagnostics::for_file(self.source.as_str());
        let schema = pipeline.detect(&content, &mut diagnostics);
        self.stage = FileStage::FormatDetected;

        let sentences = pipeline.parse(&schema, &content, &mut diagnostics);
        self.stage = FileStage::Parsed;

        let analysis = pipeline.finish(&self.source, schema, sentences, diagnostics)?;
        self.analysis = Some(analysis);
        self.stage = FileStage::Extracted;
        Ok(())
    }

    fn exclude(&mut self, reason: String) {
        log::warn!("[chapters] excluding {}: {}", self.source, reason);
        self.excluded = Some(ExcludedFile {
            index: self.index,
            source: self.source.clone(),
            failed_at: self.stage,
            reason,
        });
        self.analysis = None;
        self.stage = FileStage::Excluded;
    }

    pub(crate) fn mark_unified(&mut self) {
        if self.stage == FileStage::Extracted {
            self.stage = FileStage::Unified;
        }
    }

    /// The exclusion as a batch diagnostic.
    pub(crate) fn exclusion_diagnostic(&self) -> Option<Diagnostic> {
        let excluded = self.excluded.as_ref()?;
        Some(
            Diagnostic::error(DiagnosticKind::FileExcluded, excluded.reason.clone())
                .in_file(excluded.source.clone()),
        )
    }

    pub(crate) fn into_parts(self) -> (Option<FileAnalysis>, Option<ExcludedFile>) {
        (self.analysis, self.excluded)
    }
}
