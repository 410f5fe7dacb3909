/*!
Data model shared by the extraction pipeline and the scorer. Mentions, tokens and the tagged input
live here, together with the identifiers and ground-truth reactions used during scoring.
*/
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::{Hash, Hasher};

/// Character wrapping a mention when a sentence is rendered, as in `$serine$`.
pub const SENTINEL: char = '$';

/// Literal occurrence of a chemical name in a sentence. Two mentions are the same chemical when
/// their lowercase forms are equal; the surface form is kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChemicalMention {
    text: String,
}

impl ChemicalMention {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
    /// Surface form, as it appeared in the sentence.
    pub fn as_str(&self) -> &str {
        &self.text
    }
    /// Identity key of the mention.
    pub fn key(&self) -> String {
        self.text.to_lowercase()
    }
    pub(crate) fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl PartialEq for ChemicalMention {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text || self.key() == other.key()
    }
}
impl Eq for ChemicalMention {}

impl Hash for ChemicalMention {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl Display for ChemicalMention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Unit of a normalized sentence. Words are lowercased and stemmed, mentions are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Word(String),
    Mention(ChemicalMention),
}

impl Token {
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            Token::Mention(_) => None,
        }
    }
    pub fn as_mention(&self) -> Option<&ChemicalMention> {
        match self {
            Token::Mention(m) => Some(m),
            Token::Word(_) => None,
        }
    }
    pub fn is_mention(&self) -> bool {
        matches!(self, Token::Mention(_))
    }
    /// Is this token the (already normalized) word `word`?
    pub(crate) fn is_word(&self, word: &str) -> bool {
        self.as_word().is_some_and(|w| w == word)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{}", w),
            Token::Mention(m) => write!(f, "{}{}{}", SENTINEL, m, SENTINEL),
        }
    }
}

/// Input of the extraction: a sentence and the mentions an external tagger found in it. Both
/// fields are optional because taggers sometimes hand back incomplete records; such sentences
/// are considered malformed and never yield any candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaggedSentence {
    /// Identifier used to look up the ground truth of the sentence.
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub mentions: Option<Vec<String>>,
}

impl TaggedSentence {
    pub fn new<S: Into<String>>(
        id: impl Into<String>,
        text: impl Into<String>,
        mentions: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
            mentions: Some(mentions.into_iter().map(Into::into).collect()),
        }
    }
    pub fn is_malformed(&self) -> bool {
        self.text.is_none() || self.mentions.is_none()
    }
}

/// Canonical identifier of a chemical (InChI, ChEBI id, ...), as produced by an
/// `IdentifierResolver`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChemicalId(String);

impl ChemicalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChemicalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ChemicalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for ChemicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Known reaction of a sentence, expressed with identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroundTruthReaction {
    substrates: AHashSet<ChemicalId>,
    products: AHashSet<ChemicalId>,
}

impl GroundTruthReaction {
    pub fn new<S, P>(substrates: S, products: P) -> Self
    where
        S: IntoIterator,
        S::Item: Into<ChemicalId>,
        P: IntoIterator,
        P::Item: Into<ChemicalId>,
    {
        Self {
            substrates: substrates.into_iter().map(Into::into).collect(),
            products: products.into_iter().map(Into::into).collect(),
        }
    }
    pub fn substrates(&self) -> &AHashSet<ChemicalId> {
        &self.substrates
    }
    pub fn products(&self) -> &AHashSet<ChemicalId> {
        &self.products
    }
    /// A reaction turning a set of chemicals into the very same set carries no information and
    /// is ignored when scoring.
    pub fn is_eligible(&self) -> bool {
        self.substrates != self.products
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Serine", "serine", true)]
    #[case("L-Serine", "l-serine", true)]
    #[case("serine", "glycine", false)]
    fn test_mention_identity_ignores_case(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: bool,
    ) {
        let (left, right) = (ChemicalMention::new(left), ChemicalMention::new(right));
        assert_eq!(left == right, expected);
        let set: AHashSet<ChemicalMention> = [left, right].into_iter().collect();
        assert_eq!(set.len(), if expected { 1 } else { 2 });
    }

    #[test]
    fn test_token_display_wraps_mentions() {
        let tokens = [
            Token::Word(String::from("convers")),
            Token::Mention(ChemicalMention::new("L-serine")),
        ];
        let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, vec!["convers", "$L-serine$"]);
    }

    #[rstest]
    #[case(vec!["a"], vec!["b"], true)]
    #[case(vec!["a", "b"], vec!["b", "a"], false)]
    #[case(vec![], vec![], false)]
    #[case(vec!["a"], vec!["a", "b"], true)]
    fn test_reaction_eligibility(
        #[case] substrates: Vec<&str>,
        #[case] products: Vec<&str>,
        #[case] expected: bool,
    ) {
        let reaction = GroundTruthReaction::new(substrates, products);
        assert_eq!(reaction.is_eligible(), expected)
    }

    #[test]
    fn test_malformed_sentences() {
        let complete = TaggedSentence::new("s1", "text", ["a"]);
        assert!(!complete.is_malformed());
        let missing_mentions = TaggedSentence {
            id: String::from("s2"),
            text: Some(String::from("text")),
            mentions: None,
        };
        assert!(missing_mentions.is_malformed());
        assert!(TaggedSentence::default().is_malformed());
    }
}
