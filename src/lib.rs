//! Clause mate extraction over WebAnno TSV 3 annotations.
//!
//! A *clause mate* of a critical German pronoun (`er`, `die`, `dieser`, ...)
//! is another referential phrase of the same sentence that belongs to a
//! different coreference chain. This crate reads annotated files of varying
//! column layouts and produces one [`ClauseMateRelationship`] per pronoun and
//! clause mate:
//!
//! 1. [`FormatDetector`] reads the preamble and sampled rows into a
//!    [`SchemaDescription`] with a typed [`ColumnMap`].
//! 2. [`SchemaAwareParser`] groups token rows into [`Sentence`]s.
//! 3. [`CoreferenceExtractor`] builds per-file [`CoreferenceChain`]s.
//! 4. [`PhraseGrouper`] turns chain mentions into [`Phrase`]s.
//! 5. [`RelationshipExtractor`] pairs pronouns with their clause mates and
//!    attaches [`AntecedentDistances`].
//!
//! [`ClauseMatePipeline`] runs all stages for one file:
//!
//! ```
//! use clause_mates::{ClauseMatePipeline, PipelineConfig};
//!
//! let pipeline = ClauseMatePipeline::new(PipelineConfig::default());
//! let analysis = pipeline.analyze_text("empty.tsv", "#FORMAT=WebAnno TSV 3.3\n");
//! assert!(analysis.is_err());
//! ```
//!
//! Cross-file unification of chapter files lives in `clause-mates-chapters`.

mod antecedent;
mod config;
mod coreference;
mod diagnostics;
mod document;
mod error;
mod parser;
mod phrase;
mod pipeline;
mod relationship;
mod schema;

pub use antecedent::{AntecedentAnalyzer, AntecedentDistances};
pub use config::{LinkTypePolicy, PipelineConfig, UnificationConfig};
pub use coreference::{
    parse_link, parse_type, ChainKey, ChainLink, ChainMembership, ChainMention, ChainType,
    CoreferenceChain, CoreferenceExtractor, ExtractedChains, IdSource, TokenChains,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use document::{Animacy, LayerAnnotation, Sentence, SentenceDisplay, Token};
pub use error::{ClauseMateError, ClauseMateResult};
pub use parser::SchemaAwareParser;
pub use phrase::{Givenness, Phrase, PhraseGrouper};
pub use pipeline::{ClauseMatePipeline, ExtractionSummary, FileAnalysis};
pub use relationship::{ClauseMateRelationship, PronounMention, RelationshipExtractor};
pub use schema::{
    split_row, ColumnMap, DirectiveKind, Field, FormatClass, FormatDetector, LayerDeclaration,
    LayerKind, SchemaDescription, EXPECTED_LAYERS, FIXED_COLUMNS, LEGACY_PREAMBLE,
};

// Re-export the classifier for callers that only need pronoun lookups
pub use clause_mates_pronouns::{CriticalPronounClassifier, PronounClass};
