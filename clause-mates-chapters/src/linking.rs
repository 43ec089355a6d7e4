//! Linking chains of adjacent chapters.
//!
//! Chain ids restart in every exported file, so a referent that continues
//! into the next chapter shows up as two unrelated chains. The linker
//! proposes candidate links between chains of adjacent files, accepts them
//! greedily one-to-one, and records the accepted links as undirected graph
//! edges. Connected components of that graph are the unified chains.

use clause_mates::{
    ChainKey, ChainMention, CoreferenceChain, CriticalPronounClassifier, Diagnostic,
    DiagnosticKind, Diagnostics, FileAnalysis, UnificationConfig,
};
use pathfinding::undirected::connected_components::connected_components;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::FileOffsets;

/// A chain of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChainNode {
    pub file: usize,
    pub key: ChainKey,
}

impl ChainNode {
    pub fn new(file: usize, key: ChainKey) -> Self {
        Self { file, key }
    }
}

impl std::fmt::Display for ChainNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}:{}", self.file, self.key)
    }
}

/// Why two chains were linked, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkHeuristic {
    /// Same layer and chain id, near the shared file boundary
    IdMatch,
    /// Same layer and overlapping mention words
    TextMatch,
    /// Same layer and adjacent sentences across the boundary, where the
    /// later chain opens with a lone critical pronoun
    Proximity,
}

/// A proposed link between a chain of one file and a chain of the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainLinkCandidate {
    pub earlier: ChainNode,
    pub later: ChainNode,
    pub heuristic: LinkHeuristic,
    /// Strength within the heuristic, higher is better
    pub weight: f64,
    /// Global position of the earlier chain's first mention
    pub earlier_position: usize,
    /// Global position of the later chain's first mention
    pub later_position: usize,
}

impl ChainLinkCandidate {
    /// Precedence, then weight, then earliest positions.
    fn priority(&self, other: &Self) -> Ordering {
        self.heuristic
            .cmp(&other.heuristic)
            .then_with(|| other.weight.total_cmp(&self.weight))
            .then_with(|| self.later_position.cmp(&other.later_position))
            .then_with(|| self.earlier_position.cmp(&other.earlier_position))
            .then_with(|| self.earlier.cmp(&other.earlier))
            .then_with(|| self.later.cmp(&other.later))
    }
}

/// An included chapter as seen by the linker.
#[derive(Debug, Clone, Copy)]
pub struct ChapterView<'a> {
    pub offsets: FileOffsets,
    pub analysis: &'a FileAnalysis,
}

impl<'a> ChapterView<'a> {
    fn node(&self, chain: &CoreferenceChain) -> ChainNode {
        ChainNode::new(self.offsets.file, chain.key)
    }

    fn chains(&self) -> impl Iterator<Item = &'a CoreferenceChain> {
        self.analysis.chains.chains.values()
    }

    /// Tokens between the end of `mention` and the end of the file.
    fn tokens_after(&self, mention: &ChainMention) -> usize {
        self.offsets.token_count.saturating_sub(mention.end + 1)
    }
}

/// Undirected chain graph; every edge is stored in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainGraph {
    adjacency: BTreeMap<ChainNode, BTreeSet<ChainNode>>,
}

impl ChainGraph {
    pub fn add_node(&mut self, node: ChainNode) {
        self.adjacency.entry(node).or_default();
    }

    pub fn add_edge(&mut self, a: ChainNode, b: ChainNode) {
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn neighbours(&self, node: &ChainNode) -> impl Iterator<Item = &ChainNode> {
        self.adjacency.get(node).into_iter().flatten()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ChainNode> {
        self.adjacency.keys()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn is_symmetric(&self) -> bool {
        self.adjacency.iter().all(|(node, neighbours)| {
            neighbours
                .iter()
                .all(|n| self.adjacency.get(n).map_or(false, |back| back.contains(node)))
        })
    }

    /// Connected components, each sorted, ordered by their smallest node.
    pub fn components(&self) -> Vec<Vec<ChainNode>> {
        let starts: Vec<ChainNode> = self.nodes().copied().collect();
        let mut components: Vec<Vec<ChainNode>> =
            connected_components(&starts, |node| self.neighbours(node).copied().collect::<Vec<_>>())
                .into_iter()
                .map(|component| {
                    let mut nodes: Vec<ChainNode> = component.into_iter().collect();
                    nodes.sort();
                    nodes
                })
                .collect();
        components.sort();
        components
    }
}

/// Accepted links and the resulting graph.
#[derive(Debug, Clone, Default)]
pub struct LinkOutcome {
    pub graph: ChainGraph,
    pub links: Vec<ChainLinkCandidate>,
    pub diagnostics: Diagnostics,
}

/// Proposes and accepts chain links between adjacent chapters.
#[derive(Debug, Clone)]
pub struct ChainLinker<'c> {
    config: &'c UnificationConfig,
    classifier: CriticalPronounClassifier,
}

impl<'c> ChainLinker<'c> {
    pub fn new(config: &'c UnificationConfig) -> Self {
        Self {
            config,
            classifier: CriticalPronounClassifier::new(),
        }
    }

    /// Link every pair of adjacent chapters. `chapters` must be in file order.
    pub fn link(&self, chapters: &[ChapterView<'_>]) -> LinkOutcome {
        let mut outcome = LinkOutcome::default();

        for chapter in chapters {
            for chain in chapter.chains() {
                outcome.graph.add_node(chapter.node(chain));
            }
        }

        for pair in chapters.windows(2) {
            let (earlier, later) = (&pair[0], &pair[1]);
            let candidates = self.candidates(earlier, later);
            self.report_ambiguous(earlier, &candidates, &mut outcome.diagnostics);

            let accepted = accept_one_to_one(candidates);
            self.report_unresolved(earlier, &accepted, &mut outcome.diagnostics);

            for link in accepted {
                if link.heuristic == LinkHeuristic::Proximity {
                    log::warn!(
                        "[chapters] linked {} -> {} by proximity only ({:.2})",
                        link.earlier,
                        link.later,
                        link.weight
                    );
                } else {
                    log::debug!(
                        "[chapters] linked {} -> {} ({:?}, {:.2})",
                        link.earlier,
                        link.later,
                        link.heuristic,
                        link.weight
                    );
                }
                outcome.graph.add_edge(link.earlier, link.later);
                outcome.links.push(link);
            }
        }

        outcome
    }

    /// The best candidate for every chain pair of two adjacent chapters,
    /// sorted by priority.
    pub fn candidates(
        &self,
        earlier: &ChapterView<'_>,
        later: &ChapterView<'_>,
    ) -> Vec<ChainLinkCandidate> {
        let mut candidates = Vec::new();

        for a in earlier.chains() {
            for b in later.chains() {
                if a.key.animacy != b.key.animacy {
                    continue;
                }
                if let Some((heuristic, weight)) = self.best_heuristic(earlier, a, later, b) {
                    candidates.push(ChainLinkCandidate {
                        earlier: earlier.node(a),
                        later: later.node(b),
                        heuristic,
                        weight,
                        earlier_position: first_start(a)
                            .map_or(0, |p| earlier.offsets.global_position(p)),
                        later_position: first_start(b)
                            .map_or(0, |p| later.offsets.global_position(p)),
                    });
                }
            }
        }

        candidates.sort_by(|x, y| x.priority(y));
        candidates
    }

    fn best_heuristic(
        &self,
        earlier: &ChapterView<'_>,
        a: &CoreferenceChain,
        later: &ChapterView<'_>,
        b: &CoreferenceChain,
    ) -> Option<(LinkHeuristic, f64)> {
        let (a_first, a_last) = (a.first_mention()?, a.last_mention()?);
        let b_first = b.first_mention()?;

        if a.key == b.key
            && earlier.tokens_after(a_last) < self.config.id_match_tail_tokens
            && b_first.start < self.config.id_match_head_tokens
        {
            return Some((LinkHeuristic::IdMatch, 1.0));
        }

        let overlap = [a_last, a_first]
            .iter()
            .filter_map(|mention| self.word_overlap(mention, b_first))
            .fold(None, |best: Option<f64>, o| Some(best.map_or(o, |b| b.max(o))));
        if let Some(overlap) = overlap {
            if overlap >= self.config.text_overlap_threshold {
                return Some((LinkHeuristic::TextMatch, overlap));
            }
        }

        // A chapter opening with a full noun phrase introduces its own referent
        if !self.is_lone_pronoun(b_first) {
            return None;
        }
        let gap = later
            .offsets
            .global_sentence(b_first.sentence_id)
            .saturating_sub(earlier.offsets.global_sentence(a_last.sentence_id));
        if gap <= self.config.proximity_sentence_window {
            return Some((LinkHeuristic::Proximity, 1.0 / (1.0 + gap as f64)));
        }

        None
    }

    /// Jaccard overlap of the lowercased words of two mentions. Mentions
    /// that are a lone critical pronoun never match on text.
    fn word_overlap(&self, a: &ChainMention, b: &ChainMention) -> Option<f64> {
        if self.is_lone_pronoun(a) || self.is_lone_pronoun(b) {
            return None;
        }
        let words = |m: &ChainMention| -> BTreeSet<String> {
            m.text.split_whitespace().map(str::to_lowercase).collect()
        };
        let (a, b) = (words(a), words(b));
        let union = a.union(&b).count();
        if union == 0 {
            return None;
        }
        Some(a.intersection(&b).count() as f64 / union as f64)
    }

    fn is_lone_pronoun(&self, mention: &ChainMention) -> bool {
        mention.token_count() == 1 && self.classifier.is_critical(&mention.text)
    }

    fn report_ambiguous(
        &self,
        earlier: &ChapterView<'_>,
        candidates: &[ChainLinkCandidate],
        diagnostics: &mut Diagnostics,
    ) {
        let mut best: BTreeMap<ChainNode, (LinkHeuristic, Vec<ChainNode>)> = BTreeMap::new();
        for candidate in candidates {
            let entry = best
                .entry(candidate.earlier)
                .or_insert((candidate.heuristic, Vec::new()));
            if entry.0 == candidate.heuristic {
                entry.1.push(candidate.later);
            }
        }

        for (node, (heuristic, targets)) in best {
            if targets.len() < 2 {
                continue;
            }
            let targets: Vec<String> = targets.iter().map(ToString::to_string).collect();
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::AmbiguousChainConnection,
                    format!(
                        "{} has {} {:?} candidates: {}",
                        node,
                        targets.len(),
                        heuristic,
                        targets.join(", ")
                    ),
                )
                .in_file(earlier.analysis.source.clone()),
            );
        }
    }

    fn report_unresolved(
        &self,
        earlier: &ChapterView<'_>,
        accepted: &[ChainLinkCandidate],
        diagnostics: &mut Diagnostics,
    ) {
        for chain in earlier.chains() {
            let node = earlier.node(chain);
            let reaches_end = chain
                .last_mention()
                .map_or(false, |m| earlier.tokens_after(m) < self.config.id_match_tail_tokens);
            if reaches_end && !accepted.iter().any(|link| link.earlier == node) {
                diagnostics.push(
                    Diagnostic::info(
                        DiagnosticKind::UnresolvedChainConnection,
                        format!("{} reaches the end of its file but links to no later chain", node),
                    )
                    .in_file(earlier.analysis.source.clone()),
                );
            }
        }
    }
}

fn first_start(chain: &CoreferenceChain) -> Option<usize> {
    chain.first_mention().map(|m| m.start)
}

/// Walk candidates in priority order, keeping each chain in at most one link.
fn accept_one_to_one(candidates: Vec<ChainLinkCandidate>) -> Vec<ChainLinkCandidate> {
    let mut used_earlier = BTreeSet::new();
    let mut used_later = BTreeSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            if used_earlier.contains(&c.earlier) || used_later.contains(&c.later) {
                return false;
            }
            used_earlier.insert(c.earlier);
            used_later.insert(c.later);
            true
        })
        .collect()
}
