//! Cross-chapter unification for clause mate extraction.
//!
//! Books are annotated one chapter per file, and chain ids restart in every
//! file. This crate processes a batch of chapter files in parallel, numbers
//! their sentences and tokens globally, links chains that continue across
//! adjacent chapters, and re-tags every relationship with the unified chains
//! of its pronoun and clause mate.
//!
//! ## Core Types
//!
//! - [`ChapterFile`] / [`FileStage`] - Per-file processing state
//! - [`GlobalNumbering`] - Batch-wide sentence and token offsets
//! - [`ChainLinker`] / [`ChainGraph`] - Candidate links and the chain graph
//! - [`ChapterUnifier`] - Runs the whole batch into a [`UnificationResult`]
//!
//! ## Example
//!
//! ```no_run
//! use clause_mates::PipelineConfig;
//! use clause_mates_chapters::ChapterUnifier;
//!
//! let unifier = ChapterUnifier::new(PipelineConfig::default());
//! let result = unifier.unify_paths(&["chapter_01.tsv", "chapter_02.tsv"]);
//! println!("{} cross-file chains", result.cross_file_chain_count());
//! ```

mod linking;
mod numbering;
mod stage;
mod unify;

pub use linking::{
    ChainGraph, ChainLinkCandidate, ChainLinker, ChainNode, ChapterView, LinkHeuristic,
    LinkOutcome,
};
pub use numbering::{FileOffsets, GlobalNumbering};
pub use stage::{ChapterFile, ExcludedFile, FileStage};
pub use unify::{
    ChapterUnifier, FileReport, UnificationResult, UnifiedChain, UnifiedMention,
    UnifiedRelationship,
};
