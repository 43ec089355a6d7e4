use serde::Serialize;

use crate::CoreferenceChain;

/// Token distances from a pronoun back to its chain's earlier mentions.
///
/// Both distances are `None` when the pronoun opens its chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AntecedentDistances {
    /// Distance to the nearest earlier mention
    pub most_recent: Option<usize>,
    /// Distance to the chain's first mention
    pub first: Option<usize>,
    pub earlier_mentions: usize,
}

impl AntecedentDistances {
    pub fn has_antecedent(&self) -> bool {
        self.earlier_mentions > 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AntecedentAnalyzer;

impl AntecedentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Measure from `position` to the mentions of `chain` that start before it.
    ///
    /// Mentions in any sentence count; distances are in global token positions.
    pub fn analyze(&self, chain: &CoreferenceChain, position: usize) -> AntecedentDistances {
        let earlier = chain
            .mentions
            .iter()
            .take_while(|mention| mention.start < position);

        let mut distances = AntecedentDistances::default();
        for mention in earlier {
            let distance = position - mention.start;
            if distances.first.is_none() {
                distances.first = Some(distance);
            }
            distances.most_recent = Some(distance);
            distances.earlier_mentions += 1;
        }
        distances
    }
}
