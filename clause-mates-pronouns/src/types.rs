//! Pronoun class taxonomy.

use serde::Serialize;

/// The closed class a critical pronoun was matched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PronounClass {
    /// Third person personal pronouns: er, sie, es, ihn, ihm, ihr, ihnen
    ThirdPersonPersonal,
    /// Pronominally used determiners: der, die, das, dem, den, dessen, deren, derer, denen
    DPronoun,
    /// Demonstratives: dieser, diese, dieses, jener, jene, ...
    Demonstrative,
}

impl PronounClass {
    /// Short label used in tabular output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ThirdPersonPersonal => "PersPron",
            Self::DPronoun => "D-Pron",
            Self::Demonstrative => "DemPron",
        }
    }
}

impl std::fmt::Display for PronounClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
