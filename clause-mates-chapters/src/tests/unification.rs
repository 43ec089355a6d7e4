use crate::{ChainLinker, ChapterFile, ChapterUnifier, ChapterView, FileStage, LinkHeuristic};
use clause_mates::{Animacy, ChainKey, DiagnosticKind, PipelineConfig};

const CHAPTER_01: &str = include_str!("../../../fixtures/chapter_01.tsv");
const CHAPTER_02: &str = include_str!("../../../fixtures/chapter_02.tsv");

fn chapters() -> Vec<ChapterFile> {
    vec![
        ChapterFile::from_text(0, "chapter_01.tsv", CHAPTER_01),
        ChapterFile::from_text(1, "chapter_02.tsv", CHAPTER_02),
    ]
}

fn unifier() -> ChapterUnifier {
    ChapterUnifier::new(PipelineConfig::default())
}

#[test]
fn continuing_chain_is_unified_across_chapters() {
    let result = unifier().unify(chapters());

    assert!(result.excluded.is_empty());
    assert_eq!(result.chains.len(), 3);
    assert_eq!(result.cross_file_chain_count(), 1);

    let chain = result.chain(1).unwrap();
    assert!(chain.is_cross_file());
    assert_eq!(chain.files(), vec![0, 1]);
    assert!(chain.members.iter().all(|m| m.key == ChainKey::animate(140)));
    let texts: Vec<&str> = chain.mentions.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["Der Mann", "Er", "Er"]);
    // Chapter one has 9 tokens, so the second chapter starts at 9
    assert_eq!(chain.mentions[2].start, 9);
    assert!(chain.mentions.windows(2).all(|w| w[0].start < w[1].start));

    assert_eq!(result.links.len(), 1);
    assert_eq!(result.links[0].heuristic, LinkHeuristic::IdMatch);
}

#[test]
fn relationships_are_retagged() {
    let result = unifier().unify(chapters());

    let lines: Vec<String> = result
        .relationships
        .iter()
        .map(|r| {
            format!(
                "{} {}->{} chains {}/{} boundary={} cross={}",
                r.global_sentence_id,
                r.relationship.pronoun.text,
                r.relationship.clause_mate.text,
                r.pronoun_chain,
                r.clause_mate_chain,
                r.chapter_boundary,
                r.cross_file_relationship
            )
        })
        .collect();

    insta::assert_snapshot!(lines.join("\n"), @r###"
    2 Er->den Hund chains 1/2 boundary=false cross=true
    3 Er->Anna chains 1/3 boundary=true cross=true
    "###);
    assert_eq!(
        result.relationship_counts(),
        vec![("chapter_01.tsv", 1), ("chapter_02.tsv", 1)]
    );
}

#[test]
fn numbering_is_contiguous() {
    let result = unifier().unify(chapters());

    assert_eq!(result.numbering.total_sentences(), 4);
    assert_eq!(result.numbering.chapter_boundaries(), vec![1, 3]);
    let second = result.numbering.get(1).unwrap();
    assert_eq!(second.sentence_offset, 2);
    assert_eq!(second.token_offset, 9);
    assert_eq!(result.summary.sentences, 4);
    assert_eq!(result.summary.relationships, 2);
}

#[test]
fn every_file_ends_unified() {
    let result = unifier().unify(chapters());

    assert!(result.files.iter().all(|f| f.stage == FileStage::Unified));
}

#[test]
fn unlinked_chain_at_file_end_is_reported() {
    let result = unifier().unify(chapters());

    let unresolved: Vec<&str> = result
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnresolvedChainConnection)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert!(unresolved[0].contains("inanimate/7"), "{}", unresolved[0]);
}

#[test]
fn failing_file_is_excluded_and_the_rest_proceed() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        ChapterFile::from_text(0, "chapter_01.tsv", CHAPTER_01),
        ChapterFile::from_path(1, dir.path().join("missing.tsv")),
        ChapterFile::from_text(2, "chapter_02.tsv", CHAPTER_02),
    ];
    let result = unifier().unify(files);

    assert_eq!(result.excluded.len(), 1);
    assert_eq!(result.excluded[0].index, 1);
    assert_eq!(result.files[1].stage, FileStage::Excluded);
    assert_eq!(result.files[1].relationships, 0);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::FileExcluded));

    // The remaining chapters are adjacent and still link
    assert_eq!(result.cross_file_chain_count(), 1);
    assert_eq!(result.relationships.len(), 2);
    assert_eq!(result.relationships[1].file_index, 2);
}

#[test]
fn unify_paths_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("chapter_01.tsv");
    let second = dir.path().join("chapter_02.tsv");
    std::fs::write(&first, CHAPTER_01).unwrap();
    std::fs::write(&second, CHAPTER_02).unwrap();

    let result = unifier().unify_paths(&[first, second]);
    assert!(result.excluded.is_empty());
    assert_eq!(result.cross_file_chain_count(), 1);
}

#[test]
fn chain_graph_is_symmetric() {
    let mut files = chapters();
    let pipeline = clause_mates::ClauseMatePipeline::new(PipelineConfig::default());
    for file in files.iter_mut() {
        file.process(&pipeline);
    }
    let numbering = crate::GlobalNumbering::assign(
        files.iter().filter_map(|f| f.analysis().map(|a| (f.index, a))),
    );
    let views: Vec<ChapterView<'_>> = files
        .iter()
        .map(|f| ChapterView {
            offsets: *numbering.get(f.index).unwrap(),
            analysis: f.analysis().unwrap(),
        })
        .collect();

    let config = PipelineConfig::default().unification;
    let linker = ChainLinker::new(&config);
    let outcome = linker.link(&views);
    assert!(outcome.graph.is_symmetric());
    assert_eq!(outcome.graph.nodes().count(), 4);

    // Chain 3 opens with "Anna", so 140 reaches it by no heuristic
    let candidates = linker.candidates(&views[0], &views[1]);
    let heuristics: Vec<(u32, u32, LinkHeuristic)> = candidates
        .iter()
        .map(|c| (c.earlier.key.id, c.later.key.id, c.heuristic))
        .collect();
    assert_eq!(heuristics, vec![(140, 140, LinkHeuristic::IdMatch)]);
    assert!(candidates
        .iter()
        .all(|c| c.earlier.key.animacy == Animacy::Animate));
}

#[test]
fn unification_is_deterministic() {
    let first = serde_json::to_vec(&unifier().unify(chapters())).unwrap();
    let second = serde_json::to_vec(&unifier().unify(chapters())).unwrap();
    assert_eq!(first, second);
}
