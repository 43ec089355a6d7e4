//! A 12-column export without the relation layer.

use super::fixtures::{self, analyze};
use crate::{DiagnosticKind, FormatClass, LayerKind};

#[test]
fn incomplete_file_is_classified() {
    let analysis = analyze("incomplete.tsv", fixtures::INCOMPLETE);

    assert_eq!(analysis.schema.column_count, 12);
    assert_eq!(analysis.schema.format, FormatClass::Incomplete);
    assert_eq!(analysis.schema.missing_layers(), vec![LayerKind::Relation]);
    assert!(!analysis.schema.is_strict());
    assert_eq!(analysis.diagnostics.iter().filter(|d| d.kind == DiagnosticKind::MalformedRow).count(), 0);
}

#[test]
fn incomplete_file_still_yields_relationships() {
    let analysis = analyze("incomplete.tsv", fixtures::INCOMPLETE);

    assert_eq!(analysis.summary.sentences, 2);
    assert_eq!(analysis.relationships.len(), 1);

    let relationship = &analysis.relationships[0];
    assert_eq!(relationship.pronoun.text, "Er");
    assert_eq!(relationship.clause_mate.text, "die Frau");
    assert_eq!(relationship.num_clause_mates, 1);
}

#[test]
fn second_sentence_pronoun_measures_back_to_its_antecedent() {
    let analysis = analyze("incomplete.tsv", fixtures::INCOMPLETE);
    let chains = &analysis.chains;
    let sentences = &analysis.sentences;

    // "Sie" at position 5 continues the chain opened by "die Frau" at 2
    let sie = &sentences[1].tokens[0];
    assert_eq!(sie.position, 5);
    let chain = chains.chain(chains.membership(5).unwrap().primary().unwrap().key).unwrap();
    let distances = crate::AntecedentAnalyzer::new().analyze(chain, sie.position);
    assert_eq!(distances.most_recent, Some(3));
    assert_eq!(distances.first, Some(3));
}
