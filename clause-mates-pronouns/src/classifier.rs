//! Word-list classifier for critical pronouns.
//!
//! Sentence-initial capitalized forms are listed explicitly so matching can
//! stay case-sensitive.

use crate::PronounClass;

/// Third person personal pronouns
pub const THIRD_PERSON_PERSONAL: &[&str] = &[
    "er", "sie", "es", "ihn", "ihm", "ihr", "ihnen", //
    "Er", "Sie", "Es", "Ihn", "Ihm", "Ihr", "Ihnen",
];

/// D-pronouns (pronominally used determiners and their genitive/dative forms)
pub const D_PRONOUN: &[&str] = &[
    "der", "die", "das", "dem", "den", "dessen", "deren", "derer", "denen", //
    "Der", "Die", "Das", "Dem", "Den", "Dessen", "Deren", "Derer", "Denen",
];

/// Demonstrative pronouns
pub const DEMONSTRATIVE: &[&str] = &[
    "dieser", "diese", "dieses", "diesem", "diesen", //
    "jener", "jene", "jenes", "jenem", "jenen", //
    "Dieser", "Diese", "Dieses", "Diesem", "Diesen", //
    "Jener", "Jene", "Jenes", "Jenem", "Jenen",
];

/// Classifies token text as a critical pronoun.
///
/// The lists are checked in the order personal, d-pronoun, demonstrative; no
/// form appears in more than one list.
#[derive(Debug, Clone, Default)]
pub struct CriticalPronounClassifier;

impl CriticalPronounClassifier {
    /// Create a new CriticalPronounClassifier.
    pub fn new() -> Self {
        Self
    }

    /// Return the pronoun class of `text`, if it is critical.
    pub fn classify(&self, text: &str) -> Option<PronounClass> {
        if THIRD_PERSON_PERSONAL.contains(&text) {
            Some(PronounClass::ThirdPersonPersonal)
        } else if D_PRONOUN.contains(&text) {
            Some(PronounClass::DPronoun)
        } else if DEMONSTRATIVE.contains(&text) {
            Some(PronounClass::Demonstrative)
        } else {
            None
        }
    }

    pub fn is_critical(&self, text: &str) -> bool {
        self.classify(text).is_some()
    }
}
