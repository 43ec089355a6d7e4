//! Annotated TSV files shared by the scenario tests.

use crate::{ClauseMatePipeline, FileAnalysis, PipelineConfig};

pub const ER_DER_MANN: &str = include_str!("../../fixtures/er_der_mann.tsv");
pub const SIE_DAS_KIND: &str = include_str!("../../fixtures/sie_das_kind.tsv");
pub const INCOMPLETE: &str = include_str!("../../fixtures/incomplete.tsv");
pub const LEGACY_NO_PREAMBLE: &str = include_str!("../../fixtures/legacy_no_preamble.tsv");
pub const CHAPTER_01: &str = include_str!("../../fixtures/chapter_01.tsv");
pub const CHAPTER_02: &str = include_str!("../../fixtures/chapter_02.tsv");

pub const ALL: [(&str, &str); 6] = [
    ("er_der_mann.tsv", ER_DER_MANN),
    ("sie_das_kind.tsv", SIE_DAS_KIND),
    ("incomplete.tsv", INCOMPLETE),
    ("legacy_no_preamble.tsv", LEGACY_NO_PREAMBLE),
    ("chapter_01.tsv", CHAPTER_01),
    ("chapter_02.tsv", CHAPTER_02),
];

pub fn analyze(name: &str, content: &str) -> FileAnalysis {
    ClauseMatePipeline::new(PipelineConfig::default())
        .analyze_text(name, content)
        .unwrap()
}
