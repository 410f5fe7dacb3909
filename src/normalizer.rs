/*!
Lexical normalization of a tagged sentence. Words are lowercased and stemmed, while the words
covered by a known chemical mention are replaced by a single, untouched mention token. Mentions
are substituted longest-first and only over whole tokens, hence a mention textually contained in a
longer one (`serine` in `phosphoserine`) never intercepts it.
*/
use crate::datastructure::{ChemicalMention, Token, SENTINEL};
use itertools::Itertools;
use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};
use std::borrow::Cow;
use std::fmt::{Debug, Display};

/// Punctuation detached from the end of a word during tokenization.
const DETACHED_PUNCTUATION: [char; 4] = [',', ';', ':', '.'];

/// Default minimum length (in characters) of a mention. Shorter mentions are dropped.
pub const DEFAULT_MIN_MENTION_LEN: usize = 2;

/// Maps a single lowercase word to its stem. Implementations must be pure and deterministic.
pub trait Stemmer {
    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str>;
}

impl<T: Stemmer + ?Sized> Stemmer for &T {
    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        (**self).stem(word)
    }
}

/// English Snowball (Porter2) stemmer. This is the stemmer used by default.
pub struct PorterStemmer {
    inner: SnowballStemmer,
}

impl PorterStemmer {
    pub fn new() -> Self {
        Self {
            inner: SnowballStemmer::create(Algorithm::English),
        }
    }
}

impl Default for PorterStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for PorterStemmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PorterStemmer")
    }
}

impl Stemmer for PorterStemmer {
    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        self.inner.stem(word)
    }
}

/// Leaves every word as is. Useful when the input is already stemmed.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(word)
    }
}

/// Sentence after normalization: a flat sequence of stemmed words and mention tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedSentence {
    tokens: Vec<Token>,
}

impl NormalizedSentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
    pub fn mentions(&self) -> impl Iterator<Item = &ChemicalMention> {
        self.tokens.iter().filter_map(Token::as_mention)
    }
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Parses a sentence where the mentions are already wrapped in sentinels, such as
    /// `Reduction of $A$ and $B$ yielded $C$`. The words outside of the sentinels are stemmed.
    /// An unclosed sentinel is read as a plain word.
    pub fn from_marked<St: Stemmer + ?Sized>(text: &str, stemmer: &St) -> Self {
        let parts: Vec<&str> = text.split(SENTINEL).collect();
        let balanced = parts.len() % 2 == 1;
        let last = parts.len() - 1;
        let mut tokens = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            let inside = i % 2 == 1;
            if inside && (balanced || i != last) {
                let mention = part.trim();
                if !mention.is_empty() {
                    tokens.push(Token::Mention(ChemicalMention::new(mention)))
                }
            } else {
                let unclosed;
                let words = if inside {
                    unclosed = format!("{}{}", SENTINEL, part);
                    unclosed.as_str()
                } else {
                    part
                };
                tokens.extend(
                    tokenize(words)
                        .into_iter()
                        .map(|w| Token::Word(normalize_word(w, stemmer))),
                );
            }
        }
        Self { tokens }
    }
}

impl Display for NormalizedSentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tokens.iter().join(" "))
    }
}

/// Splits the text on whitespace and detaches the trailing punctuation of every word. A word made
/// only of punctuation is left whole.
pub(crate) fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for raw in text.split_whitespace() {
        let mut end = raw.len();
        let mut trailing = Vec::new();
        while let Some(c) = raw[..end].chars().next_back() {
            let width = c.len_utf8();
            if end > width && DETACHED_PUNCTUATION.contains(&c) {
                trailing.push(&raw[end - width..end]);
                end -= width;
            } else {
                break;
            }
        }
        tokens.push(&raw[..end]);
        tokens.extend(trailing.into_iter().rev());
    }
    tokens
}

/// Lowercases the word and stems it if it contains at least one letter.
fn normalize_word<St: Stemmer + ?Sized>(word: &str, stemmer: &St) -> String {
    let lower = word.to_lowercase();
    if lower.chars().any(char::is_alphabetic) {
        stemmer.stem(&lower).into_owned()
    } else {
        lower
    }
}

/// Trims the mentions, drops those shorter than `min_len` characters and removes the duplicates
/// (ignoring case). The result is sorted longest-first, ties broken alphabetically.
pub(crate) fn sanitize_mentions<S: AsRef<str>>(
    mentions: &[S],
    min_len: usize,
) -> Vec<ChemicalMention> {
    mentions
        .iter()
        .map(|m| m.as_ref().trim())
        .filter(|m| m.chars().count() >= min_len)
        .unique_by(|m| m.to_lowercase())
        .map(ChemicalMention::new)
        .sorted_by(|a, b| {
            b.char_len()
                .cmp(&a.char_len())
                .then_with(|| a.key().cmp(&b.key()))
        })
        .collect()
}

fn same_word(left: &str, right: &str) -> bool {
    left == right || left.to_lowercase() == right.to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Free,
    /// First word of a mention spanning that many words.
    Start(usize),
    Covered,
}

/// Normalizes `sentence`, tagging the given `mentions`. Mentions shorter than `min_mention_len`
/// characters are ignored. Tagging is case-insensitive and whole-word only; the tagged mention
/// keeps the surface form found in the sentence.
pub fn normalize<S, St>(
    sentence: &str,
    mentions: &[S],
    stemmer: &St,
    min_mention_len: usize,
) -> NormalizedSentence
where
    S: AsRef<str>,
    St: Stemmer + ?Sized,
{
    let words = tokenize(sentence);
    let mut slots = vec![Slot::Free; words.len()];
    for mention in sanitize_mentions(mentions, min_mention_len) {
        let needle = tokenize(mention.as_str());
        if needle.is_empty() || needle.len() > words.len() {
            continue;
        }
        let mut i = 0;
        while i + needle.len() <= words.len() {
            let window = i..i + needle.len();
            let fits = slots[window.clone()].iter().all(|s| *s == Slot::Free)
                && words[window.clone()]
                    .iter()
                    .zip(needle.iter())
                    .all(|(w, n)| same_word(w, n));
            if fits {
                slots[i] = Slot::Start(needle.len());
                slots[i + 1..window.end].fill(Slot::Covered);
                i = window.end;
            } else {
                i += 1;
            }
        }
    }
    let mut tokens = Vec::with_capacity(words.len());
    for (i, (word, slot)) in words.iter().zip(slots.iter()).enumerate() {
        match slot {
            Slot::Free => tokens.push(Token::Word(normalize_word(word, stemmer))),
            Slot::Start(n) => tokens.push(Token::Mention(ChemicalMention::new(
                words[i..i + n].join(" "),
            ))),
            Slot::Covered => (),
        }
    }
    NormalizedSentence { tokens }
}
