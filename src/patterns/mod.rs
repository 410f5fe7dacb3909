/*!
Pattern grammar engine. The six pattern families are compiled once into a process-wide registry,
then matched against grouped sentences to produce candidate reactions.

Within a family, the variants are tried at every position of the sentence, in their declared
order, and the first variant producing a valid candidate at that position wins it. All the
families are tried independently, so the same reaction can be extracted by several families. A candidate whose
groups hold fewer than two distinct mentions is discarded.
*/
mod compile;
mod families;

pub use compile::{
    registry, CompilationFault, PatternCompilationError, PatternRegistry, PatternTemplate,
};
pub use families::{PatternFamily, PatternFamilyParsingError};

use crate::datastructure::{ChemicalMention, TaggedSentence};
use crate::expander::expand;
use crate::grouper::{group, EntityListSpan, GroupedSentence};
use crate::normalizer::{normalize, PorterStemmer, Stemmer, DEFAULT_MIN_MENTION_LEN};
use ahash::AHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{debug, trace};

/// Reaction extracted from a sentence: the family that matched and the matched groups, in
/// sentence order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    family: PatternFamily,
    groups: Vec<EntityListSpan>,
}

impl Candidate {
    pub fn new(family: PatternFamily, groups: Vec<EntityListSpan>) -> Self {
        Self { family, groups }
    }
    pub fn family(&self) -> PatternFamily {
        self.family
    }
    pub fn groups(&self) -> &[EntityListSpan] {
        &self.groups
    }
    /// Mention strings of every group.
    pub fn expanded(&self) -> Vec<Vec<&str>> {
        self.groups.iter().map(expand).collect()
    }

    /// Splits the candidate into its reactant side and its product side. The first group holds
    /// the reactants and the following groups the products. A candidate made of a single group
    /// (`interconversion of A and B`) has its first mention as reactant and the others as
    /// products.
    pub fn sides(&self) -> (Vec<&ChemicalMention>, Vec<&ChemicalMention>) {
        match self.groups.as_slice() {
            [] => (Vec::new(), Vec::new()),
            [single] => {
                let mut mentions = single.mentions();
                let reactants = mentions.next().into_iter().collect();
                (reactants, mentions.collect())
            }
            [first, rest @ ..] => (
                first.mentions().collect(),
                rest.iter().flat_map(EntityListSpan::mentions).collect(),
            ),
        }
    }

    /// Number of distinct mentions (ignoring case) over all the groups.
    pub fn distinct_mentions(&self) -> usize {
        self.groups
            .iter()
            .flat_map(EntityListSpan::mentions)
            .collect::<AHashSet<_>>()
            .len()
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let groups = self
            .expanded()
            .into_iter()
            .map(|g| format!("[{}]", g.join(", ")))
            .join(" -> ");
        write!(f, "{}: {}", self.family, groups)
    }
}

impl PatternRegistry {
    /// Matches every family against the sentence and returns the valid candidates, families in
    /// declared order and positions left to right.
    pub fn find_candidates(&self, sentence: &GroupedSentence) -> Vec<Candidate> {
        let segments = sentence.segments();
        let mut candidates = Vec::new();
        for (family, templates) in self.families() {
            for start in 0..segments.len() {
                let winner = templates.iter().find_map(|template| {
                    let groups = template.match_at(segments, start)?;
                    let candidate = Candidate::new(family, groups.into_iter().cloned().collect());
                    if candidate.distinct_mentions() >= 2 {
                        Some(candidate)
                    } else {
                        debug!(%candidate, variant = template.variant(), "fewer than two distinct mentions, discarded");
                        None
                    }
                });
                candidates.extend(winner);
            }
        }
        candidates
    }
}

/// Runs the whole extraction pipeline: normalization, grouping and pattern matching.
#[derive(Debug, Clone)]
pub struct Extractor<St> {
    stemmer: St,
    min_mention_len: usize,
}

impl Default for Extractor<PorterStemmer> {
    fn default() -> Self {
        Self::new(PorterStemmer::new())
    }
}

impl<St: Stemmer> Extractor<St> {
    pub fn new(stemmer: St) -> Self {
        Self {
            stemmer,
            min_mention_len: DEFAULT_MIN_MENTION_LEN,
        }
    }
    pub fn with_min_mention_len(mut self, min_mention_len: usize) -> Self {
        self.min_mention_len = min_mention_len;
        self
    }
    pub fn stemmer(&self) -> &St {
        &self.stemmer
    }

    /// Extracts the candidates of a tagged sentence. A malformed sentence (missing text or
    /// mentions) has no candidate. The only error is the failure to build the pattern registry.
    pub fn extract(
        &self,
        sentence: &TaggedSentence,
    ) -> Result<Vec<Candidate>, PatternCompilationError> {
        Ok(self.extract_with(registry()?, sentence))
    }

    pub fn extract_text<S: AsRef<str>>(
        &self,
        text: &str,
        mentions: &[S],
    ) -> Result<Vec<Candidate>, PatternCompilationError> {
        let registry = registry()?;
        let normalized = normalize(text, mentions, &self.stemmer, self.min_mention_len);
        Ok(registry.find_candidates(&group(&normalized)))
    }

    pub(crate) fn extract_with(
        &self,
        registry: &PatternRegistry,
        sentence: &TaggedSentence,
    ) -> Vec<Candidate> {
        let (Some(text), Some(mentions)) = (&sentence.text, &sentence.mentions) else {
            debug!(id = sentence.id.as_str(), "malformed sentence, no candidate");
            return Vec::new();
        };
        let normalized = normalize(text, mentions, &self.stemmer, self.min_mention_len);
        let grouped = group(&normalized);
        let candidates = registry.find_candidates(&grouped);
        trace!(id = sentence.id.as_str(), %grouped, candidates = candidates.len(), "sentence matched");
        candidates
    }
}
