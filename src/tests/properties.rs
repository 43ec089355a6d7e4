use super::fixtures::{self, analyze};
use crate::{AntecedentAnalyzer, ChainKey};

#[test]
fn every_relationship_has_a_clause_mate() {
    for (name, content) in fixtures::ALL {
        let analysis = analyze(name, content);
        for relationship in &analysis.relationships {
            assert!(relationship.num_clause_mates >= 1, "{}", name);
        }
    }
}

#[test]
fn chain_mentions_strictly_increase() {
    for (name, content) in fixtures::ALL {
        let analysis = analyze(name, content);
        for chain in analysis.chains.chains.values() {
            assert!(
                chain.mentions.windows(2).all(|w| w[0].end < w[1].start),
                "{}: {}",
                name,
                chain.key
            );
        }
    }
}

#[test]
fn tokens_belong_to_one_sentence() {
    for (name, content) in fixtures::ALL {
        let analysis = analyze(name, content);
        let positions: Vec<usize> = analysis
            .sentences
            .iter()
            .flat_map(|s| s.tokens.iter().map(|t| t.position))
            .collect();
        let expected: Vec<usize> = (0..analysis.token_count()).collect();
        assert_eq!(positions, expected, "{}", name);
        assert!(analysis
            .sentences
            .iter()
            .all(|s| s.tokens.iter().all(|t| t.sentence_id == s.id)));
    }
}

#[test]
fn phrases_stay_inside_their_sentence() {
    for (name, content) in fixtures::ALL {
        let analysis = analyze(name, content);
        for phrase in &analysis.phrases {
            let (first, last) = analysis
                .sentence(phrase.sentence_id)
                .and_then(|s| s.position_range())
                .unwrap();
            assert!(first <= phrase.start && phrase.end <= last, "{}: {:?}", name, phrase);
        }
    }
}

#[test]
fn analysis_is_idempotent() {
    for (name, content) in fixtures::ALL {
        let first = serde_json::to_vec(&analyze(name, content)).unwrap();
        let second = serde_json::to_vec(&analyze(name, content)).unwrap();
        assert_eq!(first, second, "{}", name);
    }
}

#[test]
fn antecedent_distance_follows_positions() {
    let analysis = analyze("er_der_mann.tsv", fixtures::ER_DER_MANN);
    let chain = analysis.chains.chain(ChainKey::animate(140)).unwrap();
    let analyzer = AntecedentAnalyzer::new();

    let first = analyzer.analyze(chain, chain.mentions[0].start);
    assert_eq!(first.most_recent, None);
    assert_eq!(first.first, None);

    let second = analyzer.analyze(chain, chain.mentions[1].start);
    assert_eq!(
        second.most_recent,
        Some(chain.mentions[1].start - chain.mentions[0].start)
    );
    assert_eq!(second.most_recent, Some(4));
}

#[test]
fn relationship_rows_are_ordered() {
    for (name, content) in fixtures::ALL {
        let analysis = analyze(name, content);
        let keys: Vec<(usize, usize, usize)> = analysis
            .relationships
            .iter()
            .map(|r| (r.sentence_id, r.pronoun.position, r.clause_mate.start))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "{}", name);
    }
}
