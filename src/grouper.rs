/*!
Groups the mentions of a normalized sentence into entity lists. The grammar is

```text
group := mention (glue mention)*
glue  := ","? "and"? "with"?
```

The scanner is greedy and never backtracks: a glue that is not followed by a mention is left in
the sentence as plain words. Every mention ends up in exactly one group, possibly a group of one.
*/
use crate::datastructure::{ChemicalMention, Token};
use crate::normalizer::NormalizedSentence;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Glue words, in the order they may appear between two mentions.
const GLUE: [&str; 3] = [",", "and", "with"];

/// Maximal run of mentions joined by glue. It keeps the tokens it covers (glue included) and the
/// index of its first token in the normalized sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityListSpan {
    start: usize,
    tokens: Vec<Token>,
}

impl EntityListSpan {
    /// Position of the first token of the span in the normalized sentence.
    pub fn start(&self) -> usize {
        self.start
    }
    /// Position right after the last token of the span.
    pub fn end(&self) -> usize {
        self.start + self.tokens.len()
    }
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
    /// Mentions of the span, in sentence order.
    pub fn mentions(&self) -> impl Iterator<Item = &ChemicalMention> {
        self.tokens.iter().filter_map(Token::as_mention)
    }
    /// Number of mentions in the span.
    pub fn len(&self) -> usize {
        self.mentions().count()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for EntityListSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.tokens.iter().join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Word(String),
    Group(EntityListSpan),
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Word(w) => write!(f, "{}", w),
            Segment::Group(g) => write!(f, "{}", g),
        }
    }
}

/// Sentence where every mention belongs to an `EntityListSpan`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupedSentence {
    segments: Vec<Segment>,
}

impl GroupedSentence {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
    pub fn spans(&self) -> impl Iterator<Item = &EntityListSpan> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Group(g) => Some(g),
            Segment::Word(_) => None,
        })
    }
    /// Flattens the sentence back into its tokens.
    pub fn tokens(&self) -> Vec<Token> {
        self.segments
            .iter()
            .flat_map(|s| match s {
                Segment::Word(w) => vec![Token::Word(w.clone())],
                Segment::Group(g) => g.tokens.clone(),
            })
            .collect()
    }
    /// Groups the sentence again. Grouping is idempotent, so this returns an identical sentence.
    pub fn regroup(&self) -> GroupedSentence {
        group_tokens(&self.tokens())
    }
}

impl Display for GroupedSentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.iter().join(" "))
    }
}

pub fn group(sentence: &NormalizedSentence) -> GroupedSentence {
    group_tokens(sentence.tokens())
}

pub(crate) fn group_tokens(tokens: &[Token]) -> GroupedSentence {
    let mut segments = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Word(w) => {
                segments.push(Segment::Word(w.clone()));
                i += 1;
            }
            Token::Mention(_) => {
                let start = i;
                let mut end = i + 1;
                while let Some(next) = glue_then_mention(tokens, end) {
                    end = next;
                }
                segments.push(Segment::Group(EntityListSpan {
                    start,
                    tokens: tokens[start..end].to_vec(),
                }));
                i = end;
            }
        }
    }
    GroupedSentence { segments }
}

/// Consumes an optional glue followed by a mention, starting at `at`. Returns the position right
/// after the mention.
fn glue_then_mention(tokens: &[Token], at: usize) -> Option<usize> {
    let mut cursor = at;
    for glue in GLUE {
        if tokens.get(cursor).is_some_and(|t| t.is_word(glue)) {
            cursor += 1;
        }
    }
    match tokens.get(cursor) {
        Some(Token::Mention(_)) => Some(cursor + 1),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::normalizer::IdentityStemmer;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck as quickcheck_test;
    use rstest::rstest;

    fn grouped(marked: &str) -> GroupedSentence {
        group(&NormalizedSentence::from_marked(marked, &IdentityStemmer))
    }

    #[rstest]
    #[case("$A$ , $B$ and $C$ to $D$", "{$A$ , $B$ and $C$} to {$D$}")]
    #[case("$A$, $B$, and $C$", "{$A$ , $B$ , and $C$}")]
    #[case("$A$ with $B$", "{$A$ with $B$}")]
    #[case("$A$ $B$", "{$A$ $B$}")]
    #[case("$A$ and then $B$", "{$A$} and then {$B$}")]
    #[case("$A$ and", "{$A$} and")]
    #[case("$A$ and and $B$", "{$A$} and and {$B$}")]
    #[case("no mention here", "no mention here")]
    fn test_grouping(#[case] marked: &str, #[case] expected: &str) {
        assert_eq!(grouped(marked).to_string(), expected)
    }

    #[test]
    fn test_span_positions() {
        let sentence = grouped("reduct of $A$ and $B$ yield $C$");
        let spans: Vec<(usize, usize, usize)> = sentence
            .spans()
            .map(|s| (s.start(), s.end(), s.len()))
            .collect();
        assert_eq!(spans, vec![(2, 5, 2), (6, 7, 1)]);
    }

    #[test]
    fn test_span_mentions_keep_order() {
        let sentence = grouped("$B$, $A$ and $C$");
        let span = sentence.spans().next().unwrap();
        let mentions: Vec<&str> = span.mentions().map(|m| m.as_str()).collect();
        assert_eq!(mentions, vec!["B", "A", "C"]);
    }

    #[derive(Debug, Clone)]
    struct TokenSequence(Vec<Token>);

    impl Arbitrary for TokenSequence {
        fn arbitrary(g: &mut Gen) -> Self {
            let words = ["and", "with", ",", "to", "yield", "of"];
            let mentions = ["A", "B", "C"];
            let tokens = (0..usize::arbitrary(g) % 20)
                .map(|_| {
                    if bool::arbitrary(g) {
                        Token::Word(g.choose(&words).unwrap().to_string())
                    } else {
                        Token::Mention(ChemicalMention::new(*g.choose(&mentions).unwrap()))
                    }
                })
                .collect();
            TokenSequence(tokens)
        }
    }

    #[quickcheck_test]
    fn prop_grouping_is_idempotent(tokens: TokenSequence) -> bool {
        let once = group_tokens(&tokens.0);
        let twice = once.regroup();
        once == twice && twice.regroup() == once
    }

    #[quickcheck_test]
    fn prop_grouping_preserves_tokens(tokens: TokenSequence) -> bool {
        group_tokens(&tokens.0).tokens() == tokens.0
    }

    #[quickcheck_test]
    fn prop_adjacent_groups_never_mergeable(tokens: TokenSequence) -> bool {
        let sentence = group_tokens(&tokens.0);
        let flat = sentence.tokens();
        let ok = sentence
            .spans()
            .all(|span| glue_then_mention(&flat, span.end()).is_none());
        ok
    }
}
