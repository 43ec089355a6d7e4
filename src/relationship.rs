//! Clause mate relationships between critical pronouns and co-occurring
//! referential phrases.

use clause_mates_pronouns::{CriticalPronounClassifier, PronounClass};
use serde::Serialize;

use crate::{
    AntecedentAnalyzer, AntecedentDistances, ChainKey, ExtractedChains, Givenness, Phrase,
    Sentence, Token,
};

/// A critical pronoun anchoring clause mate relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PronounMention {
    pub sentence_id: usize,
    /// Global token position
    pub position: usize,
    pub text: String,
    pub class: PronounClass,
    /// Animate membership, else inanimate
    pub chain: ChainKey,
    /// The inanimate membership when the pronoun belongs to both layers
    pub secondary_chain: Option<ChainKey>,
    pub grammatical_role: Option<String>,
    pub thematic_role: Option<String>,
    pub givenness: Givenness,
}

impl PronounMention {
    /// Chains the pronoun belongs to.
    pub fn chains(&self) -> impl Iterator<Item = ChainKey> {
        std::iter::once(self.chain).chain(self.secondary_chain)
    }
}

/// One row of output: a pronoun paired with one of its clause mates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseMateRelationship {
    pub sentence_id: usize,
    pub pronoun: PronounMention,
    pub clause_mate: Phrase,
    /// Number of clause mates of this pronoun, at least 1
    pub num_clause_mates: usize,
    pub antecedent: AntecedentDistances,
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipExtractor {
    classifier: CriticalPronounClassifier,
    analyzer: AntecedentAnalyzer,
}

impl RelationshipExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Critical pronouns of a sentence that anchor relationships.
    ///
    /// A classified form that opens a longer phrase of its chain (`das Kind`)
    /// is a determiner and is skipped.
    pub fn anchors(
        &self,
        sentence: &Sentence,
        phrases: &[Phrase],
        chains: &ExtractedChains,
    ) -> Vec<PronounMention> {
        sentence
            .tokens
            .iter()
            .filter_map(|token| self.anchor(token, phrases, chains))
            .collect()
    }

    fn anchor(
        &self,
        token: &Token,
        phrases: &[Phrase],
        chains: &ExtractedChains,
    ) -> Option<PronounMention> {
        let class = self.classifier.classify(&token.text)?;
        let memberships = chains.membership(token.position)?;
        let own = memberships.primary()?.key;

        let phrase = phrases
            .iter()
            .find(|p| p.chain == own && p.contains(token.position))?;
        if phrase.token_count() != 1 {
            return None;
        }

        let secondary_chain = memberships
            .iter()
            .map(|m| m.key)
            .find(|key| *key != own);

        Some(PronounMention {
            sentence_id: token.sentence_id,
            position: token.position,
            text: token.text.clone(),
            class,
            chain: own,
            secondary_chain,
            grammatical_role: token.grammatical_role.clone(),
            thematic_role: token.thematic_role.clone(),
            givenness: phrase.givenness,
        })
    }

    /// Pair every anchor of the sentence with each of its clause mates.
    ///
    /// Rows are ordered by pronoun position, then clause mate start.
    pub fn extract(
        &self,
        sentence: &Sentence,
        phrases: &[Phrase],
        chains: &ExtractedChains,
    ) -> Vec<ClauseMateRelationship> {
        let mut relationships = Vec::new();

        for pronoun in self.anchors(sentence, phrases, chains) {
            let clause_mates: Vec<&Phrase> = phrases
                .iter()
                .filter(|p| p.sentence_id == sentence.id)
                .filter(|p| !p.contains(pronoun.position))
                .filter(|p| pronoun.chains().all(|key| key != p.chain))
                .collect();
            if clause_mates.is_empty() {
                continue;
            }

            let antecedent = chains
                .chain(pronoun.chain)
                .map(|chain| self.analyzer.analyze(chain, pronoun.position))
                .unwrap_or_default();

            let num_clause_mates = clause_mates.len();
            for clause_mate in clause_mates {
                relationships.push(ClauseMateRelationship {
                    sentence_id: sentence.id,
                    pronoun: pronoun.clone(),
                    clause_mate: clause_mate.clone(),
                    num_clause_mates,
                    antecedent,
                });
            }
        }

        relationships
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoreferenceExtractor, Diagnostics, LayerAnnotation, PhraseGrouper};

    fn token(position: usize, text: &str, animate: &str, inanimate: &str) -> Token {
        let value = |v: &str| if v.is_empty() { None } else { Some(v.to_string()) };
        Token {
            position,
            sentence_id: 1,
            index_in_sentence: position + 1,
            line: position + 1,
            text: text.to_string(),
            grammatical_role: None,
            thematic_role: None,
            animate: LayerAnnotation::new(value(animate), None),
            inanimate: LayerAnnotation::new(value(inanimate), None),
        }
    }

    fn run(tokens: Vec<Token>) -> (Vec<PronounMention>, Vec<ClauseMateRelationship>) {
        let sentence = Sentence {
            id: 1,
            text: String::new(),
            tokens,
        };
        let chains = CoreferenceExtractor::default()
            .extract(std::slice::from_ref(&sentence), &mut Diagnostics::default());
        let phrases = PhraseGrouper::new().group(&sentence, &chains);
        let extractor = RelationshipExtractor::new();
        (
            extractor.anchors(&sentence, &phrases, &chains),
            extractor.extract(&sentence, &phrases, &chains),
        )
    }

    #[test]
    fn test_determiner_is_not_an_anchor() {
        let (anchors, relationships) = run(vec![
            token(0, "sie", "*->99-1", ""),
            token(1, "sah", "", ""),
            token(2, "das", "", "*->55-1"),
            token(3, "Kind", "", "*->55-1"),
        ]);

        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].class, PronounClass::ThirdPersonPersonal);
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].clause_mate.text, "das Kind");
        assert_eq!(relationships[0].num_clause_mates, 1);
    }

    #[test]
    fn test_same_chain_is_not_a_clause_mate() {
        let (anchors, relationships) = run(vec![
            token(0, "er", "*->1-1", ""),
            token(1, "und", "", ""),
            token(2, "Peter", "*->1-2", ""),
        ]);

        assert_eq!(anchors.len(), 1);
        assert!(relationships.is_empty());
    }

    #[test]
    fn test_unannotated_pronoun_is_ignored() {
        let (anchors, relationships) = run(vec![
            token(0, "er", "", ""),
            token(1, "Anna", "*->2-1", ""),
        ]);

        assert!(anchors.is_empty());
        assert!(relationships.is_empty());
    }

    #[test]
    fn test_every_pronoun_gets_its_own_rows() {
        let (anchors, relationships) = run(vec![
            token(0, "er", "*->1-1", ""),
            token(1, "gab", "", ""),
            token(2, "ihr", "*->2-1", ""),
            token(3, "das", "", "*->3-1"),
            token(4, "Buch", "", "*->3-1"),
        ]);

        assert_eq!(anchors.len(), 2);
        assert_eq!(relationships.len(), 4);
        assert!(relationships.iter().all(|r| r.num_clause_mates == 2));
        let order: Vec<(usize, usize)> = relationships
            .iter()
            .map(|r| (r.pronoun.position, r.clause_mate.start))
            .collect();
        assert_eq!(order, vec![(0, 2), (0, 3), (2, 0), (2, 3)]);
    }

    #[test]
    fn test_pronoun_in_both_layers_excludes_both_chains() {
        let (anchors, relationships) = run(vec![
            token(0, "es", "*->4-1", "*->6-1"),
            token(1, "traf", "", ""),
            token(2, "Anna", "*->5-1", ""),
            token(3, "Haus", "", "*->6-2"),
        ]);

        assert_eq!(anchors[0].chain, ChainKey::animate(4));
        assert_eq!(anchors[0].secondary_chain, Some(ChainKey::inanimate(6)));
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].clause_mate.text, "Anna");
    }
}
