//! Referential phrases: one per chain mention.

use serde::Serialize;

use crate::{Animacy, ChainKey, ExtractedChains, Sentence, SentenceDisplay};

/// Whether a phrase introduces its referent or picks it up again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Givenness {
    /// The phrase is the chain's first mention
    New,
    Given,
}

impl Givenness {
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Given => "given",
        }
    }
}

impl std::fmt::Display for Givenness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Contiguous tokens of one chain within one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phrase {
    pub sentence_id: usize,
    pub text: String,
    /// Global position of the first token
    pub start: usize,
    /// Global position of the last token (inclusive)
    pub end: usize,
    pub chain: ChainKey,
    /// Roles of the first token
    pub grammatical_role: Option<String>,
    pub thematic_role: Option<String>,
    pub givenness: Givenness,
}

impl Phrase {
    pub fn animacy(&self) -> Animacy {
        self.chain.animacy
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn token_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// Label used when drawing the phrase under its sentence.
    pub fn display_label(&self) -> String {
        format!("{} {}", self.chain, self.givenness)
    }
}

/// Groups a sentence's chain-bearing tokens into phrases.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseGrouper;

impl PhraseGrouper {
    pub fn new() -> Self {
        Self
    }

    /// Phrases of one sentence, ordered by start position then animacy.
    pub fn group(&self, sentence: &Sentence, chains: &ExtractedChains) -> Vec<Phrase> {
        let mut phrases: Vec<Phrase> = Vec::new();

        for animacy in Animacy::ALL {
            let mut open: Option<Phrase> = None;

            for token in &sentence.tokens {
                let key = chains
                    .membership(token.position)
                    .and_then(|m| m.get(animacy))
                    .map(|m| m.key);

                let extends = match (&open, key) {
                    (Some(phrase), Some(key)) => {
                        phrase.chain == key && phrase.end + 1 == token.position
                    }
                    _ => false,
                };

                if extends {
                    if let Some(phrase) = open.as_mut() {
                        phrase.end = token.position;
                        phrase.text.push(' ');
                        phrase.text.push_str(&token.text);
                    }
                    continue;
                }

                phrases.extend(open.take());
                open = key.map(|key| Phrase {
                    sentence_id: sentence.id,
                    text: token.text.clone(),
                    start: token.position,
                    end: token.position,
                    chain: key,
                    grammatical_role: token.grammatical_role.clone(),
                    thematic_role: token.thematic_role.clone(),
                    givenness: Givenness::Given,
                });
            }
            phrases.extend(open);
        }

        for phrase in phrases.iter_mut() {
            let is_first = chains
                .chain(phrase.chain)
                .and_then(|chain| chain.first_mention())
                .map_or(false, |first| first.start == phrase.start);
            if is_first {
                phrase.givenness = Givenness::New;
            }
        }

        phrases.sort_by_key(|p| (p.start, p.chain.animacy));
        phrases
    }

    /// Draw a sentence with its phrases underneath.
    pub fn display<'a>(&self, sentence: &'a Sentence, phrases: &[Phrase]) -> SentenceDisplay<'a> {
        let mut display = SentenceDisplay::new(sentence);
        for phrase in phrases.iter().filter(|p| p.sentence_id == sentence.id) {
            display.include(phrase.start, phrase.end, phrase.display_label());
        }
        display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoreferenceExtractor, Diagnostics, LayerAnnotation, Token};

    fn token(position: usize, sentence_id: usize, text: &str, animate: &str, role: &str) -> Token {
        let value = |v: &str| if v.is_empty() { None } else { Some(v.to_string()) };
        Token {
            position,
            sentence_id,
            index_in_sentence: position + 1,
            line: position + 1,
            text: text.to_string(),
            grammatical_role: value(role),
            thematic_role: None,
            animate: LayerAnnotation::new(value(animate), None),
            inanimate: LayerAnnotation::default(),
        }
    }

    fn sentences() -> Vec<Sentence> {
        vec![
            Sentence {
                id: 1,
                text: "der Mann sah Anna".to_string(),
                tokens: vec![
                    token(0, 1, "der", "*->1-1", "SUBJ"),
                    token(1, 1, "Mann", "*->1-1", "HEAD"),
                    token(2, 1, "sah", "", ""),
                    token(3, 1, "Anna", "*->2-1", "OBJ"),
                ],
            },
            Sentence {
                id: 2,
                text: "er mag sie".to_string(),
                tokens: vec![
                    token(4, 2, "er", "*->1-2", "SUBJ"),
                    token(5, 2, "mag", "", ""),
                    token(6, 2, "sie", "*->2-2", "OBJ"),
                ],
            },
        ]
    }

    #[test]
    fn test_phrases_follow_mentions() {
        let sentences = sentences();
        let chains = CoreferenceExtractor::default().extract(&sentences, &mut Diagnostics::default());
        let grouper = PhraseGrouper::new();

        let first = grouper.group(&sentences[0], &chains);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].text, "der Mann");
        assert_eq!(first[0].grammatical_role.as_deref(), Some("SUBJ"));
        assert_eq!(first[0].givenness, Givenness::New);
        assert_eq!(first[1].text, "Anna");

        let second = grouper.group(&sentences[1], &chains);
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|p| p.givenness == Givenness::Given));
        assert!(second.iter().all(|p| p.sentence_id == 2));
    }

    #[test]
    fn test_phrase_count_matches_mentions() {
        let sentences = sentences();
        let chains = CoreferenceExtractor::default().extract(&sentences, &mut Diagnostics::default());
        let grouper = PhraseGrouper::new();

        let phrases: usize = sentences.iter().map(|s| grouper.group(s, &chains).len()).sum();
        let mentions: usize = chains.chains.values().map(|c| c.len()).sum();
        assert_eq!(phrases, mentions);
    }

    #[test]
    fn test_display() {
        let sentences = sentences();
        let chains = CoreferenceExtractor::default().extract(&sentences, &mut Diagnostics::default());
        let grouper = PhraseGrouper::new();
        let phrases = grouper.group(&sentences[0], &chains);

        insta::assert_snapshot!(grouper.display(&sentences[0], &phrases), @r###"
        der  Mann  sah  Anna
        ╰───────╯animate/1 new
                        ╰──╯animate/2 new
        "###);
    }
}
