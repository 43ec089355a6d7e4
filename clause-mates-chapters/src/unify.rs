use clause_mates::{
    ClauseMatePipeline, ClauseMateRelationship, Diagnostic, ExtractionSummary, PipelineConfig,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::{
    ChainLinkCandidate, ChainLinker, ChainNode, ChapterFile, ChapterView, ExcludedFile,
    FileStage, GlobalNumbering,
};

/// A mention placed in batch-wide numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedMention {
    pub file: usize,
    /// Global sentence id
    pub sentence_id: usize,
    /// Global token positions (inclusive)
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// One referent across the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedChain {
    /// Order of first appearance, starting at 1
    pub id: usize,
    pub members: Vec<ChainNode>,
    /// Mentions of all members ordered by global position
    pub mentions: Vec<UnifiedMention>,
}

impl UnifiedChain {
    /// Files the chain has members in, ascending.
    pub fn files(&self) -> Vec<usize> {
        let mut files: Vec<usize> = self.members.iter().map(|m| m.file).collect();
        files.dedup();
        files
    }

    pub fn is_cross_file(&self) -> bool {
        self.files().len() > 1
    }
}

/// A relationship re-tagged with its place in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedRelationship {
    pub source_file: String,
    pub file_index: usize,
    pub global_sentence_id: usize,
    /// The sentence is the first of its file
    pub chapter_boundary: bool,
    /// The pronoun's or clause mate's referent spans several files
    pub cross_file_relationship: bool,
    pub pronoun_chain: usize,
    pub clause_mate_chain: usize,
    pub relationship: ClauseMateRelationship,
}

/// Per-file line of the batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub index: usize,
    pub source: String,
    pub stage: FileStage,
    pub summary: Option<ExtractionSummary>,
    pub relationships: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnificationResult {
    pub files: Vec<FileReport>,
    pub numbering: GlobalNumbering,
    pub chains: Vec<UnifiedChain>,
    pub links: Vec<ChainLinkCandidate>,
    pub relationships: Vec<UnifiedRelationship>,
    pub excluded: Vec<ExcludedFile>,
    pub diagnostics: Vec<Diagnostic>,
    /// Sum over included files
    pub summary: ExtractionSummary,
}

impl UnificationResult {
    pub fn cross_file_chain_count(&self) -> usize {
        self.chains.iter().filter(|c| c.is_cross_file()).count()
    }

    /// Relationship count of every file, in batch order.
    pub fn relationship_counts(&self) -> Vec<(&str, usize)> {
        self.files
            .iter()
            .map(|f| (f.source.as_str(), f.relationships))
            .collect()
    }

    pub fn chain(&self, id: usize) -> Option<&UnifiedChain> {
        id.checked_sub(1).and_then(|idx| self.chains.get(idx))
    }
}

/// Processes chapter files in parallel, then unifies their chains.
#[derive(Debug, Clone, Default)]
pub struct ChapterUnifier {
    pipeline: ClauseMatePipeline,
}

impl ChapterUnifier {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            pipeline: ClauseMatePipeline::new(config),
        }
    }

    /// Unify files read from disk, in the given order.
    pub fn unify_paths<P: AsRef<Path>>(&self, paths: &[P]) -> UnificationResult {
        let files = paths
            .iter()
            .enumerate()
            .map(|(index, path)| ChapterFile::from_path(index, path.as_ref()))
            .collect();
        self.unify(files)
    }

    /// Unify chapters in the order given.
    pub fn unify(&self, mut files: Vec<ChapterFile>) -> UnificationResult {
        log::info!("[chapters] processing {} files", files.len());
        files.par_iter_mut().for_each(|file| file.process(&self.pipeline));

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        for file in &files {
            diagnostics.extend(file.exclusion_diagnostic());
            if let Some(analysis) = file.analysis() {
                diagnostics.extend(analysis.diagnostics.iter().cloned());
            }
        }

        let numbering = GlobalNumbering::assign(
            files
                .iter()
                .filter_map(|f| f.analysis().map(|analysis| (f.index, analysis))),
        );
        let views: Vec<ChapterView<'_>> = files
            .iter()
            .filter_map(|f| {
                let analysis = f.analysis()?;
                let offsets = *numbering.get(f.index)?;
                Some(ChapterView { offsets, analysis })
            })
            .collect();

        let outcome = ChainLinker::new(&self.pipeline.config().unification).link(&views);
        let chains = build_chains(&views, outcome.graph.components());
        let relationships = retag(&views, &chains);
        diagnostics.extend(outcome.diagnostics.into_vec());
        let links = outcome.links;

        let mut summary = ExtractionSummary::default();
        let mut reports = Vec::new();
        let mut excluded = Vec::new();
        for mut file in files {
            file.mark_unified();
            let stage = file.stage();
            let (index, source) = (file.index, file.source.clone());
            let (analysis, exclusion) = file.into_parts();
            if let Some(analysis) = &analysis {
                summary += analysis.summary;
            }
            excluded.extend(exclusion);
            reports.push(FileReport {
                index,
                source,
                stage,
                summary: analysis.as_ref().map(|a| a.summary),
                relationships: analysis.as_ref().map_or(0, |a| a.relationships.len()),
            });
        }

        log::info!(
            "[chapters] {} unified chains ({} cross-file), {} relationships, {} files excluded",
            chains.len(),
            chains.iter().filter(|c| c.is_cross_file()).count(),
            relationships.len(),
            excluded.len()
        );

        UnificationResult {
            files: reports,
            numbering,
            chains,
            links,
            relationships,
            excluded,
            diagnostics,
            summary,
        }
    }
}

fn build_chains(views: &[ChapterView<'_>], components: Vec<Vec<ChainNode>>) -> Vec<UnifiedChain> {
    let by_file: BTreeMap<usize, &ChapterView<'_>> =
        views.iter().map(|v| (v.offsets.file, v)).collect();

    let mut chains: Vec<UnifiedChain> = components
        .into_iter()
        .map(|members| {
            let mut mentions = Vec::new();
            for member in &members {
                let Some(view) = by_file.get(&member.file) else {
                    continue;
                };
                let Some(chain) = view.analysis.chains.chain(member.key) else {
                    continue;
                };
                mentions.extend(chain.mentions.iter().map(|m| UnifiedMention {
                    file: member.file,
                    sentence_id: view.offsets.global_sentence(m.sentence_id),
                    start: view.offsets.global_position(m.start),
                    end: view.offsets.global_position(m.end),
                    text: m.text.clone(),
                }));
            }
            mentions.sort_by_key(|m| (m.start, m.end));
            UnifiedChain {
                id: 0,
                members,
                mentions,
            }
        })
        .collect();

    chains.sort_by_key(|c| (c.mentions.first().map(|m| m.start), c.members.first().copied()));
    for (idx, chain) in chains.iter_mut().enumerate() {
        chain.id = idx + 1;
    }
    chains
}

fn retag(views: &[ChapterView<'_>], chains: &[UnifiedChain]) -> Vec<UnifiedRelationship> {
    let mut chain_of: BTreeMap<ChainNode, &UnifiedChain> = BTreeMap::new();
    for chain in chains {
        for member in &chain.members {
            chain_of.insert(*member, chain);
        }
    }

    let mut relationships = Vec::new();
    for view in views {
        let file = view.offsets.file;
        for relationship in &view.analysis.relationships {
            let pronoun = chain_of.get(&ChainNode::new(file, relationship.pronoun.chain));
            let clause_mate = chain_of.get(&ChainNode::new(file, relationship.clause_mate.chain));
            let (Some(pronoun), Some(clause_mate)) = (pronoun, clause_mate) else {
                continue;
            };

            relationships.push(UnifiedRelationship {
                source_file: view.analysis.source.clone(),
                file_index: file,
                global_sentence_id: view.offsets.global_sentence(relationship.sentence_id),
                chapter_boundary: view.offsets.is_chapter_boundary(relationship.sentence_id),
                cross_file_relationship: pronoun.is_cross_file() || clause_mate.is_cross_file(),
                pronoun_chain: pronoun.id,
                clause_mate_chain: clause_mate.id,
                relationship: relationship.clone(),
            });
        }
    }
    relationships
}
