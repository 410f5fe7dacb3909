/*!
Classification of a single sentence against its ground truth.

A candidate matches a reaction when its reactant side shares at least one identifier with the
substrates of the reaction and its product side shares at least one identifier with the products.
Candidates are tried in extraction order and, for each candidate, the reactions in their declared
order; the first matching pair wins.
*/
use crate::datastructure::{ChemicalId, ChemicalMention, GroundTruthReaction};
use crate::patterns::Candidate;
use crate::resolver::IdentifierResolver;
use ahash::{AHashMap, AHashSet};
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// The five mutually exclusive outcomes of a sentence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
pub enum OutcomeBucket {
    TruePositive,
    TruePositiveMiss,
    FalsePositive,
    FalseNegative,
    TrueNegative,
}

impl Display for OutcomeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Outcome of a sentence, with the data supporting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The winning pair.
    TruePositive {
        candidate: Candidate,
        reaction: GroundTruthReaction,
    },
    /// Candidates were extracted, none of them matches the ground truth.
    TruePositiveMiss { candidates: Vec<Candidate> },
    /// Candidates were extracted from a sentence without any reaction.
    FalsePositive { candidates: Vec<Candidate> },
    FalseNegative,
    TrueNegative,
}

impl Outcome {
    pub fn bucket(&self) -> OutcomeBucket {
        match self {
            Outcome::TruePositive { .. } => OutcomeBucket::TruePositive,
            Outcome::TruePositiveMiss { .. } => OutcomeBucket::TruePositiveMiss,
            Outcome::FalsePositive { .. } => OutcomeBucket::FalsePositive,
            Outcome::FalseNegative => OutcomeBucket::FalseNegative,
            Outcome::TrueNegative => OutcomeBucket::TrueNegative,
        }
    }
    /// Candidates kept by the outcome: the winner of a true positive, all of them for a miss or a
    /// false positive.
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Outcome::TruePositive { candidate, .. } => std::slice::from_ref(candidate),
            Outcome::TruePositiveMiss { candidates } | Outcome::FalsePositive { candidates } => {
                candidates
            }
            Outcome::FalseNegative | Outcome::TrueNegative => &[],
        }
    }
}

/// Which sides of a candidate are compared with which sides of a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Reactants against substrates and products against products.
    #[default]
    Directed,
    /// Also accept the reversed reaction.
    Either,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("impossible to parse `{0}` into an orientation")]
pub struct OrientationParsingError(pub String);

impl FromStr for Orientation {
    type Err = OrientationParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "directed" => Ok(Orientation::Directed),
            "either" | "undirected" => Ok(Orientation::Either),
            _ => Err(OrientationParsingError(String::from(s))),
        }
    }
}

/// Gives the known reactions of a sentence. Reactions are returned in their declared order,
/// which is the tie-break when several reactions match the same candidate.
pub trait GroundTruthStore {
    fn reactions(&self, sentence_id: &str) -> &[GroundTruthReaction];
}

/// Ground truth held in memory, keyed by sentence id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryStore {
    reactions: AHashMap<String, Vec<GroundTruthReaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    /// Appends a reaction to the ground truth of the sentence.
    pub fn insert(&mut self, sentence_id: impl Into<String>, reaction: GroundTruthReaction) {
        self.reactions
            .entry(sentence_id.into())
            .or_default()
            .push(reaction)
    }
    /// Number of sentences with at least one reaction.
    pub fn len(&self) -> usize {
        self.reactions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, GroundTruthReaction)> for InMemoryStore {
    fn from_iter<T: IntoIterator<Item = (S, GroundTruthReaction)>>(iter: T) -> Self {
        let mut store = Self::new();
        for (id, reaction) in iter {
            store.insert(id, reaction);
        }
        store
    }
}

impl GroundTruthStore for InMemoryStore {
    fn reactions(&self, sentence_id: &str) -> &[GroundTruthReaction] {
        self.reactions
            .get(sentence_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Resolves every mention of a sentence at most once.
struct SentenceIds<'r, R: ?Sized> {
    resolver: &'r R,
    known: AHashMap<String, Option<ChemicalId>>,
}

impl<'r, R: IdentifierResolver + ?Sized> SentenceIds<'r, R> {
    fn new(resolver: &'r R) -> Self {
        Self {
            resolver,
            known: AHashMap::new(),
        }
    }

    fn resolve_all(&mut self, mentions: &[&ChemicalMention]) -> AHashSet<ChemicalId> {
        mentions
            .iter()
            .filter_map(|mention| {
                let resolver = self.resolver;
                self.known
                    .entry(mention.key())
                    .or_insert_with(|| match resolver.resolve(mention.as_str()) {
                        Ok(id) => Some(id),
                        Err(error) => {
                            debug!(%error, "mention excluded from identifier matching");
                            None
                        }
                    })
                    .clone()
            })
            .collect()
    }
}

/// Classifies sentences, resolving mentions with an [`IdentifierResolver`].
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'r, R: ?Sized> {
    resolver: &'r R,
    orientation: Orientation,
}

impl<'r, R: IdentifierResolver + ?Sized> Scorer<'r, R> {
    pub fn new(resolver: &'r R, orientation: Orientation) -> Self {
        Self {
            resolver,
            orientation,
        }
    }

    /// Classifies a sentence given its candidates (in extraction order) and its reactions.
    /// Ineligible reactions are ignored; a sentence with only ineligible reactions has no ground
    /// truth.
    pub fn score(&self, candidates: Vec<Candidate>, reactions: &[GroundTruthReaction]) -> Outcome {
        let eligible: Vec<&GroundTruthReaction> =
            reactions.iter().filter(|r| r.is_eligible()).collect();
        match (candidates.is_empty(), eligible.is_empty()) {
            (true, true) => Outcome::TrueNegative,
            (true, false) => Outcome::FalseNegative,
            (false, true) => Outcome::FalsePositive { candidates },
            (false, false) => match self.first_match(&candidates, &eligible) {
                Some((i, reaction)) => {
                    let reaction = reaction.clone();
                    let mut candidates = candidates;
                    Outcome::TruePositive {
                        candidate: candidates.swap_remove(i),
                        reaction,
                    }
                }
                None => Outcome::TruePositiveMiss { candidates },
            },
        }
    }

    fn first_match<'g>(
        &self,
        candidates: &[Candidate],
        reactions: &[&'g GroundTruthReaction],
    ) -> Option<(usize, &'g GroundTruthReaction)> {
        let mut ids = SentenceIds::new(self.resolver);
        for (i, candidate) in candidates.iter().enumerate() {
            let (reactants, products) = candidate.sides();
            let reactants = ids.resolve_all(&reactants);
            let products = ids.resolve_all(&products);
            if let Some(reaction) = reactions
                .iter()
                .find(|r| self.subset_match(&reactants, &products, r))
            {
                return Some((i, *reaction));
            }
        }
        None
    }

    fn subset_match(
        &self,
        reactants: &AHashSet<ChemicalId>,
        products: &AHashSet<ChemicalId>,
        reaction: &GroundTruthReaction,
    ) -> bool {
        let directed = !reactants.is_disjoint(reaction.substrates())
            && !products.is_disjoint(reaction.products());
        match self.orientation {
            Orientation::Directed => directed,
            Orientation::Either => {
                directed
                    || (!reactants.is_disjoint(reaction.products())
                        && !products.is_disjoint(reaction.substrates()))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grouper::group;
    use crate::normalizer::{IdentityStemmer, NormalizedSentence};
    use crate::patterns::{registry, PatternFamily};
    use crate::resolver::MapResolver;
    use rstest::rstest;

    fn candidates(marked: &str) -> Vec<Candidate> {
        let sentence = group(&NormalizedSentence::from_marked(marked, &IdentityStemmer));
        registry().unwrap().find_candidates(&sentence)
    }

    fn resolver() -> MapResolver {
        [("A", "id:a"), ("B", "id:b"), ("C", "id:c"), ("D", "id:d")]
            .into_iter()
            .collect()
    }

    fn reaction(substrates: &[&str], products: &[&str]) -> GroundTruthReaction {
        GroundTruthReaction::new(substrates.to_vec(), products.to_vec())
    }

    #[rstest]
    #[case("no reaction here", vec![], OutcomeBucket::TrueNegative)]
    #[case("no reaction here", vec![reaction(&["id:a"], &["id:b"])], OutcomeBucket::FalseNegative)]
    #[case("$A$ <--> $B$", vec![], OutcomeBucket::FalsePositive)]
    #[case("$A$ <--> $B$", vec![reaction(&["id:a"], &["id:b"])], OutcomeBucket::TruePositive)]
    #[case("$A$ <--> $B$", vec![reaction(&["id:c"], &["id:b"])], OutcomeBucket::TruePositiveMiss)]
    #[case("$A$ <--> $B$", vec![reaction(&["id:b"], &["id:a"])], OutcomeBucket::TruePositiveMiss)]
    #[case("$A$ and $C$ <--> $B$", vec![reaction(&["id:a", "id:d"], &["id:b"])], OutcomeBucket::TruePositive)]
    #[case("$A$ <--> $B$", vec![reaction(&["id:a"], &["id:a"])], OutcomeBucket::FalsePositive)]
    #[case("no reaction here", vec![reaction(&["id:a"], &["id:a"])], OutcomeBucket::TrueNegative)]
    fn test_buckets(
        #[case] marked: &str,
        #[case] reactions: Vec<GroundTruthReaction>,
        #[case] expected: OutcomeBucket,
    ) {
        let resolver = resolver();
        let scorer = Scorer::new(&resolver, Orientation::Directed);
        let outcome = scorer.score(candidates(marked), &reactions);
        assert_eq!(outcome.bucket(), expected)
    }

    #[test]
    fn test_either_orientation_accepts_reversed_reactions() {
        let resolver = resolver();
        let reversed = vec![reaction(&["id:b"], &["id:a"])];
        let directed = Scorer::new(&resolver, Orientation::Directed);
        let either = Scorer::new(&resolver, Orientation::Either);
        assert_eq!(
            directed.score(candidates("$A$ <--> $B$"), &reversed).bucket(),
            OutcomeBucket::TruePositiveMiss
        );
        assert_eq!(
            either.score(candidates("$A$ <--> $B$"), &reversed).bucket(),
            OutcomeBucket::TruePositive
        );
    }

    #[test]
    fn test_true_positive_keeps_the_first_matching_pair() {
        let resolver = resolver();
        let scorer = Scorer::new(&resolver, Orientation::Directed);
        // Both TriggerFirst and Yield extract ([A, B], [C]), TriggerFirst comes first.
        let found = candidates("reduction of $A$ and $B$ yield $C$");
        assert_eq!(found.len(), 2);
        let reactions = vec![
            reaction(&["id:d"], &["id:c"]),
            reaction(&["id:b"], &["id:c", "id:d"]),
            reaction(&["id:a"], &["id:c"]),
        ];
        match scorer.score(found, &reactions) {
            Outcome::TruePositive {
                candidate,
                reaction,
            } => {
                assert_eq!(candidate.family(), PatternFamily::TriggerFirst);
                assert_eq!(reaction, reactions[1]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_mentions_are_excluded() {
        let resolver = resolver();
        let scorer = Scorer::new(&resolver, Orientation::Directed);
        let outcome = scorer.score(
            candidates("$unknown$ and $A$ <--> $B$"),
            &[reaction(&["id:a"], &["id:b"])],
        );
        assert_eq!(outcome.bucket(), OutcomeBucket::TruePositive);
        let outcome = scorer.score(
            candidates("$unknown$ <--> $B$"),
            &[reaction(&["id:a"], &["id:b"])],
        );
        assert_eq!(outcome.bucket(), OutcomeBucket::TruePositiveMiss);
        assert_eq!(outcome.candidates().len(), 1);
    }

    #[test]
    fn test_store_keeps_declared_order() {
        let store: InMemoryStore = [
            ("s1", reaction(&["id:a"], &["id:b"])),
            ("s1", reaction(&["id:c"], &["id:d"])),
        ]
        .into_iter()
        .collect();
        assert_eq!(store.reactions("s1")[1], reaction(&["id:c"], &["id:d"]));
        assert!(store.reactions("s2").is_empty());
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    #[case("directed", Ok(Orientation::Directed))]
    #[case(" Either", Ok(Orientation::Either))]
    #[case("sideways", Err(OrientationParsingError(String::from("sideways"))))]
    fn test_parse_orientation(
        #[case] input: &str,
        #[case] expected: Result<Orientation, OrientationParsingError>,
    ) {
        assert_eq!(input.parse::<Orientation>(), expected)
    }
}
