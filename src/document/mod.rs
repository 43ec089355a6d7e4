//! Token and sentence records produced by the parser.

mod display;

pub use display::SentenceDisplay;

use serde::Serialize;

/// Which coreference layer an annotation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Animacy {
    Animate,
    Inanimate,
}

impl Animacy {
    pub const ALL: [Animacy; 2] = [Animacy::Animate, Animacy::Inanimate];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Animate => "animate",
            Self::Inanimate => "inanimate",
        }
    }
}

impl std::fmt::Display for Animacy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw coreference annotation of one layer on one token.
///
/// Both values are kept verbatim (`*->140-2`, `PersPron[140]`); the
/// coreference extractor interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerAnnotation {
    pub link: Option<String>,
    pub kind: Option<String>,
}

impl LayerAnnotation {
    pub fn new(link: Option<String>, kind: Option<String>) -> Self {
        Self { link, kind }
    }

    pub fn is_empty(&self) -> bool {
        self.link.is_none() && self.kind.is_none()
    }
}

/// One annotated word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// 0-based position among all tokens of the file
    pub position: usize,
    /// 1-based sentence id, local to the file
    pub sentence_id: usize,
    /// 1-based index within the sentence
    pub index_in_sentence: usize,
    /// 1-based source line
    pub line: usize,
    pub text: String,
    pub grammatical_role: Option<String>,
    pub thematic_role: Option<String>,
    pub animate: LayerAnnotation,
    pub inanimate: LayerAnnotation,
}

impl Token {
    /// The raw annotation of one coreference layer.
    pub fn layer(&self, animacy: Animacy) -> &LayerAnnotation {
        match animacy {
            Animacy::Animate => &self.animate,
            Animacy::Inanimate => &self.inanimate,
        }
    }
}

/// Tokens between two sentence markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sentence {
    /// 1-based id, local to the file
    pub id: usize,
    /// Source text from the `#Text=` marker
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            tokens: Vec::new(),
        }
    }

    /// The first word of the sentence.
    pub fn first_word(&self) -> Option<&str> {
        self.tokens.first().map(|t| t.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Inclusive range of global token positions covered by this sentence.
    pub fn position_range(&self) -> Option<(usize, usize)> {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => Some((first.position, last.position)),
            _ => None,
        }
    }

    /// Look up a token by its global position.
    pub fn token_at(&self, position: usize) -> Option<&Token> {
        let (first, _) = self.position_range()?;
        self.tokens.get(position.checked_sub(first)?)
    }
}
