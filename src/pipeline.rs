//! Per-file extraction: detect, parse, extract chains, group phrases, pair
//! pronouns with clause mates.

use serde::Serialize;
use std::fs;
use std::ops::AddAssign;
use std::path::Path;

use crate::{
    ClauseMateError, ClauseMateRelationship, ClauseMateResult, CoreferenceExtractor, Diagnostic,
    DiagnosticKind, Diagnostics, ExtractedChains, FormatDetector, Phrase, PhraseGrouper,
    PipelineConfig, RelationshipExtractor, SchemaAwareParser, SchemaDescription, Sentence,
    SentenceDisplay,
};

/// Counters reported per file and summed per batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub sentences: usize,
    pub tokens: usize,
    pub chains: usize,
    pub critical_pronouns: usize,
    pub phrases: usize,
    pub relationships: usize,
}

impl AddAssign for ExtractionSummary {
    fn add_assign(&mut self, other: Self) {
        self.sentences += other.sentences;
        self.tokens += other.tokens;
        self.chains += other.chains;
        self.critical_pronouns += other.critical_pronouns;
        self.phrases += other.phrases;
        self.relationships += other.relationships;
    }
}

impl std::fmt::Display for ExtractionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sentences, {} tokens, {} chains, {} critical pronouns, {} phrases, {} relationships",
            self.sentences,
            self.tokens,
            self.chains,
            self.critical_pronouns,
            self.phrases,
            self.relationships
        )
    }
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub source: String,
    pub schema: SchemaDescription,
    pub sentences: Vec<Sentence>,
    pub chains: ExtractedChains,
    /// Phrases of all sentences, in sentence order
    pub phrases: Vec<Phrase>,
    pub relationships: Vec<ClauseMateRelationship>,
    pub summary: ExtractionSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileAnalysis {
    pub fn sentence(&self, id: usize) -> Option<&Sentence> {
        self.sentences.iter().find(|s| s.id == id)
    }

    /// Total token count, which is one past the last global position.
    pub fn token_count(&self) -> usize {
        self.summary.tokens
    }

    /// Draw one sentence with its phrases underneath.
    pub fn display_sentence(&self, id: usize) -> Option<SentenceDisplay<'_>> {
        let sentence = self.sentence(id)?;
        Some(PhraseGrouper::new().display(sentence, &self.phrases))
    }
}

/// Runs the per-file stages with one configuration.
///
/// The pipeline holds no per-file state, so one instance can analyze many
/// files concurrently.
#[derive(Debug, Clone, Default)]
pub struct ClauseMatePipeline {
    config: PipelineConfig,
    detector: FormatDetector,
    grouper: PhraseGrouper,
    relationships: RelationshipExtractor,
}

impl ClauseMatePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Describe the schema of `content`, or force the legacy layout when
    /// adaptive parsing is off.
    pub fn detect(&self, content: &str, diagnostics: &mut Diagnostics) -> SchemaDescription {
        if self.config.adaptive_parsing {
            return self.detector.detect(content, diagnostics);
        }
        diagnostics.push(Diagnostic::info(
            DiagnosticKind::UnverifiedSchema,
            "adaptive parsing disabled, using legacy column map",
        ));
        self.detector.legacy(content, diagnostics)
    }

    pub fn parse(
        &self,
        schema: &SchemaDescription,
        content: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Sentence> {
        SchemaAwareParser::new(schema).parse(content, diagnostics)
    }

    /// Chains, phrases and relationships of parsed sentences.
    pub fn extract(
        &self,
        sentences: &[Sentence],
        diagnostics: &mut Diagnostics,
    ) -> (ExtractedChains, Vec<Phrase>, Vec<ClauseMateRelationship>, ExtractionSummary) {
        let chains =
            CoreferenceExtractor::new(self.config.link_type_policy).extract(sentences, diagnostics);

        let mut phrases = Vec::new();
        let mut relationships = Vec::new();
        let mut summary = ExtractionSummary {
            sentences: sentences.len(),
            tokens: sentences.iter().map(Sentence::len).sum(),
            chains: chains.len(),
            ..ExtractionSummary::default()
        };

        for sentence in sentences {
            let sentence_phrases = self.grouper.group(sentence, &chains);
            summary.critical_pronouns += self
                .relationships
                .anchors(sentence, &sentence_phrases, &chains)
                .len();
            relationships.extend(self.relationships.extract(sentence, &sentence_phrases, &chains));
            phrases.extend(sentence_phrases);
        }
        summary.phrases = phrases.len();
        summary.relationships = relationships.len();

        (chains, phrases, relationships, summary)
    }

    /// Analyze in-memory content. `source` names the file in diagnostics.
    pub fn analyze_text(&self, source: &str, content: &str) -> ClauseMateResult<FileAnalysis> {
        let mut diagnostics = Diagnostics::for_file(source);
        let schema = self.detect(content, &mut diagnostics);
        let sentences = self.parse(&schema, content, &mut diagnostics);
        self.finish(source, schema, sentences, diagnostics)
    }

    /// Run extraction over already parsed sentences and assemble the result.
    pub fn finish(
        &self,
        source: &str,
        schema: SchemaDescription,
        sentences: Vec<Sentence>,
        mut diagnostics: Diagnostics,
    ) -> ClauseMateResult<FileAnalysis> {
        if sentences.iter().all(Sentence::is_empty) {
            return Err(ClauseMateError::EmptyDocument {
                path: source.to_string(),
            });
        }

        let (chains, phrases, relationships, summary) = self.extract(&sentences, &mut diagnostics);
        log::info!("[pipeline] {}: {}", source, summary);

        Ok(FileAnalysis {
            source: source.to_string(),
            schema,
            sentences,
            chains,
            phrases,
            relationships,
            summary,
            diagnostics: diagnostics.into_vec(),
        })
    }

    pub fn analyze_path(&self, path: &Path) -> ClauseMateResult<FileAnalysis> {
        let source = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source_error| ClauseMateError::Io {
            path: source.clone(),
            source: source_error,
        })?;
        self.analyze_text(&source, &content)
    }
}
