//! Coreference chain extraction.
//!
//! Each coreference layer encodes a token's chain twice:
//!
//! ```text
//! link: *->140-2        occurrence 2 of chain 140
//! type: PersPron[140]   a PersPron mention of chain 140
//! ```
//!
//! The extractor reconciles the two encodings per layer, then appends one
//! mention per contiguous same-chain token run to that chain. Chain ids are
//! namespaced by layer: animate chain 5 and inanimate chain 5 are unrelated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::{
    Animacy, Diagnostic, DiagnosticKind, Diagnostics, LinkTypePolicy, Sentence, Token,
};

static LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*->(\d+)-(\d+)$").expect("Invalid link regex"));

static TYPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\[\]*>|]*)(?:\[(\d+)\])?$").expect("Invalid type regex"));

/// Identifies a chain within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChainKey {
    pub animacy: Animacy,
    pub id: u32,
}

impl ChainKey {
    pub fn new(animacy: Animacy, id: u32) -> Self {
        Self { animacy, id }
    }

    pub fn animate(id: u32) -> Self {
        Self::new(Animacy::Animate, id)
    }

    pub fn inanimate(id: u32) -> Self {
        Self::new(Animacy::Inanimate, id)
    }
}

impl std::fmt::Display for ChainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.animacy, self.id)
    }
}

/// A parsed `*-><chain>-<occurrence>` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink {
    pub chain: u32,
    pub occurrence: u32,
}

/// A parsed `<TypeLabel>[<chain>]` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainType {
    pub label: Option<String>,
    pub chain: Option<u32>,
}

/// Parse a single link value.
pub fn parse_link(value: &str) -> Option<ChainLink> {
    let caps = LINK_PATTERN.captures(value.trim())?;
    Some(ChainLink {
        chain: caps[1].parse().ok()?,
        occurrence: caps[2].parse().ok()?,
    })
}

/// Parse a single type value. A bare label carries no chain id.
///
/// Link-shaped values (`*->5-1`) are not labels and fail to parse.
pub fn parse_type(value: &str) -> Option<ChainType> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let caps = TYPE_PATTERN.captures(value)?;
    let label = caps
        .get(1)
        .map(|m| m.as_str().trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string);
    let chain = match caps.get(2) {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };
    if label.is_none() && chain.is_none() {
        return None;
    }
    Some(ChainType { label, chain })
}

/// Which encoding the chain id was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    Link,
    Type,
    /// Both encodings agree
    Both,
}

/// A token's membership in one chain of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainMembership {
    pub key: ChainKey,
    pub occurrence: Option<u32>,
    pub type_label: Option<String>,
    pub source: IdSource,
}

/// Zero, one or two memberships of a token, one per layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenChains {
    pub animate: Option<ChainMembership>,
    pub inanimate: Option<ChainMembership>,
}

impl TokenChains {
    pub fn get(&self, animacy: Animacy) -> Option<&ChainMembership> {
        match animacy {
            Animacy::Animate => self.animate.as_ref(),
            Animacy::Inanimate => self.inanimate.as_ref(),
        }
    }

    fn set(&mut self, animacy: Animacy, membership: Option<ChainMembership>) {
        match animacy {
            Animacy::Animate => self.animate = membership,
            Animacy::Inanimate => self.inanimate = membership,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainMembership> {
        self.animate.iter().chain(self.inanimate.iter())
    }

    /// The animate membership, else the inanimate one.
    pub fn primary(&self) -> Option<&ChainMembership> {
        self.animate.as_ref().or(self.inanimate.as_ref())
    }

    pub fn contains(&self, key: ChainKey) -> bool {
        self.iter().any(|m| m.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.animate.is_none() && self.inanimate.is_none()
    }
}

/// One mention of a chain: a contiguous token run in one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainMention {
    pub sentence_id: usize,
    /// Global position of the first token
    pub start: usize,
    /// Global position of the last token (inclusive)
    pub end: usize,
    pub text: String,
    /// Occurrence number from the link, when present
    pub occurrence: Option<u32>,
}

impl ChainMention {
    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn token_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// All mentions of one chain in one file, ordered by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreferenceChain {
    pub key: ChainKey,
    pub mentions: Vec<ChainMention>,
}

impl CoreferenceChain {
    pub fn animacy(&self) -> Animacy {
        self.key.animacy
    }

    pub fn first_mention(&self) -> Option<&ChainMention> {
        self.mentions.first()
    }

    pub fn last_mention(&self) -> Option<&ChainMention> {
        self.mentions.last()
    }

    /// Index of the mention covering `position`.
    pub fn mention_index_at(&self, position: usize) -> Option<usize> {
        self.mentions.iter().position(|m| m.contains(position))
    }

    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }
}

/// Chains and per-token memberships of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedChains {
    #[serde(serialize_with = "serialize_chains")]
    pub chains: BTreeMap<ChainKey, CoreferenceChain>,
    /// Indexed by global token position
    pub memberships: Vec<TokenChains>,
}

impl ExtractedChains {
    pub fn chain(&self, key: ChainKey) -> Option<&CoreferenceChain> {
        self.chains.get(&key)
    }

    pub fn membership(&self, position: usize) -> Option<&TokenChains> {
        self.memberships.get(position)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

// Struct keys don't map to JSON object keys; each chain carries its key anyway
fn serialize_chains<S: Serializer>(
    chains: &BTreeMap<ChainKey, CoreferenceChain>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(chains.values())
}

#[derive(Debug, Clone, Copy)]
struct OpenMention {
    key: ChainKey,
    sentence_id: usize,
    last_position: usize,
}

/// Incremental chain state for one file's extraction.
#[derive(Debug, Default)]
struct ChainBuilder {
    chains: BTreeMap<ChainKey, Vec<ChainMention>>,
    open: [Option<OpenMention>; 2],
}

impl ChainBuilder {
    fn slot(animacy: Animacy) -> usize {
        match animacy {
            Animacy::Animate => 0,
            Animacy::Inanimate => 1,
        }
    }

    fn add(&mut self, token: &Token, membership: &ChainMembership) {
        let slot = Self::slot(membership.key.animacy);
        let continues = self.open[slot].map_or(false, |open| {
            open.key == membership.key
                && open.sentence_id == token.sentence_id
                && open.last_position + 1 == token.position
        });

        let mentions = self.chains.entry(membership.key).or_default();
        match mentions.last_mut().filter(|_| continues) {
            Some(mention) => {
                mention.end = token.position;
                mention.text.push(' ');
                mention.text.push_str(&token.text);
            }
            None => mentions.push(ChainMention {
                sentence_id: token.sentence_id,
                start: token.position,
                end: token.position,
                text: token.text.clone(),
                occurrence: membership.occurrence,
            }),
        }

        self.open[slot] = Some(OpenMention {
            key: membership.key,
            sentence_id: token.sentence_id,
            last_position: token.position,
        });
    }

    fn close(&mut self, animacy: Animacy) {
        self.open[Self::slot(animacy)] = None;
    }

    fn build(self) -> BTreeMap<ChainKey, CoreferenceChain> {
        self.chains
            .into_iter()
            .map(|(key, mentions)| (key, CoreferenceChain { key, mentions }))
            .collect()
    }
}

/// Builds per-file coreference chains from parsed sentences.
#[derive(Debug, Clone, Default)]
pub struct CoreferenceExtractor {
    policy: LinkTypePolicy,
}

impl CoreferenceExtractor {
    pub fn new(policy: LinkTypePolicy) -> Self {
        Self { policy }
    }

    pub fn extract(&self, sentences: &[Sentence], diagnostics: &mut Diagnostics) -> ExtractedChains {
        let mut builder = ChainBuilder::default();
        let mut memberships = Vec::new();

        for sentence in sentences {
            for token in &sentence.tokens {
                let mut chains = TokenChains::default();
                for animacy in Animacy::ALL {
                    let membership = self.membership(token, animacy, diagnostics);
                    match &membership {
                        Some(m) => builder.add(token, m),
                        None => builder.close(animacy),
                    }
                    chains.set(animacy, membership);
                }

                // Positions are dense, but stay safe if a caller built tokens by hand
                if memberships.len() <= token.position {
                    memberships.resize(token.position + 1, TokenChains::default());
                }
                memberships[token.position] = chains;
            }
            for animacy in Animacy::ALL {
                builder.close(animacy);
            }
        }

        ExtractedChains {
            chains: builder.build(),
            memberships,
        }
    }

    /// Interpret one layer's annotation on `token`.
    pub fn membership(
        &self,
        token: &Token,
        animacy: Animacy,
        diagnostics: &mut Diagnostics,
    ) -> Option<ChainMembership> {
        let annotation = token.layer(animacy);

        let link = annotation.link.as_deref().and_then(|value| {
            let parsed = value.split('|').find_map(parse_link);
            if parsed.is_none() {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::MalformedAnnotation,
                        format!("unparseable {} link {:?} on {:?}", animacy, value, token.text),
                    )
                    .at_line(token.line),
                );
            }
            parsed
        });

        let kind = annotation.kind.as_deref().and_then(|value| {
            let candidates: Vec<ChainType> = value.split('|').filter_map(parse_type).collect();
            if candidates.is_empty() {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::MalformedAnnotation,
                        format!("unparseable {} type {:?} on {:?}", animacy, value, token.text),
                    )
                    .at_line(token.line),
                );
            }
            let with_chain = candidates.iter().position(|c| c.chain.is_some());
            candidates.into_iter().nth(with_chain.unwrap_or(0))
        });

        let type_label = kind.as_ref().and_then(|k| k.label.clone());
        let type_chain = kind.as_ref().and_then(|k| k.chain);

        let (id, occurrence, source) = match (link, type_chain) {
            (Some(link), Some(chain)) if link.chain == chain => {
                (chain, Some(link.occurrence), IdSource::Both)
            }
            (Some(link), Some(chain)) => {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::LinkTypeConflict,
                        format!(
                            "{} link names chain {} but type names chain {} on {:?}",
                            animacy, link.chain, chain, token.text
                        ),
                    )
                    .at_line(token.line),
                );
                match self.policy {
                    LinkTypePolicy::LinkWins => (link.chain, Some(link.occurrence), IdSource::Link),
                    LinkTypePolicy::TypeWins => (chain, None, IdSource::Type),
                }
            }
            (Some(link), None) => (link.chain, Some(link.occurrence), IdSource::Link),
            (None, Some(chain)) => (chain, None, IdSource::Type),
            (None, None) => return None,
        };

        Some(ChainMembership {
            key: ChainKey::new(animacy, id),
            occurrence,
            type_label,
            source,
        })
    }
}
