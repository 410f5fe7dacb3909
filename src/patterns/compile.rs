/*!
Compilation of the family table into matchers, and the process-wide registry holding them.
*/
use super::families::{Element, FamilySpec, Matching, PatternFamily, Vocabulary, FAMILIES};
use crate::grouper::{EntityListSpan, Segment};
use std::sync::OnceLock;
use thiserror::Error;

/// What is wrong with a misconfigured variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationFault {
    #[error("the variant is empty")]
    EmptyVariant,
    #[error("the variant has no group anchor")]
    NoGroup,
    #[error("two adjacent groups can never match, the grouper would have merged them")]
    AdjacentGroups,
    #[error("the variant uses a {0} but the family has no {0} vocabulary")]
    MissingVocabulary(&'static str),
    #[error("the {0} vocabulary is empty")]
    EmptyVocabulary(&'static str),
    #[error("vocabulary entry `{0}` is not a lowercase word")]
    InvalidEntry(String),
}

/// Raised while building the pattern registry. The registry is shared by the whole process, so
/// this error is fatal to any extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pattern family {family} (variant {variant}) is misconfigured: {fault}")]
pub struct PatternCompilationError {
    pub family: PatternFamily,
    pub variant: usize,
    pub fault: CompilationFault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WordMatcher {
    forms: Box<[&'static str]>,
    matching: Matching,
}

impl WordMatcher {
    fn compile(vocabulary: &Vocabulary, role: &'static str) -> Result<Self, CompilationFault> {
        if vocabulary.entries.is_empty() {
            return Err(CompilationFault::EmptyVocabulary(role));
        }
        let mut forms = Vec::with_capacity(vocabulary.entries.len() * 2);
        for (word, stem) in vocabulary.entries {
            for form in [*word, *stem] {
                if !is_vocabulary_word(form) {
                    return Err(CompilationFault::InvalidEntry(form.to_string()));
                }
            }
            match vocabulary.matching {
                // The stem is a prefix of every inflection, the dictionary form is not needed.
                Matching::Prefix => forms.push(*stem),
                Matching::Exact => forms.extend([*word, *stem]),
            }
        }
        forms.sort_unstable();
        forms.dedup();
        Ok(Self {
            forms: forms.into_boxed_slice(),
            matching: vocabulary.matching,
        })
    }

    pub(crate) fn matches(&self, word: &str) -> bool {
        match self.matching {
            Matching::Prefix => self.forms.iter().any(|f| word.starts_with(f)),
            Matching::Exact => self.forms.iter().any(|f| *f == word),
        }
    }
}

fn is_vocabulary_word(form: &str) -> bool {
    !form.is_empty() && form.chars().all(|c| c.is_ascii_lowercase())
}

/// A word is a wildcard gap when it is made of letters, digits and underscores only.
pub(crate) fn is_plain_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_alphanumeric() || c == '_')
}

pub(crate) fn is_arrow(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| matches!(c, '<' | '-' | '>'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Matcher {
    Group,
    Word(WordMatcher),
    Literal(&'static str),
    Gap,
    Arrow,
}

/// Compiled variant of a pattern family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTemplate {
    family: PatternFamily,
    variant: usize,
    matchers: Box<[Matcher]>,
}

impl PatternTemplate {
    pub fn family(&self) -> PatternFamily {
        self.family
    }
    /// Position of the variant in its family, starting at 0.
    pub fn variant(&self) -> usize {
        self.variant
    }

    fn compile(spec: &FamilySpec, variant: usize) -> Result<Self, PatternCompilationError> {
        let fail = |fault| PatternCompilationError {
            family: spec.family,
            variant,
            fault,
        };
        let elements = spec.variants[variant];
        if elements.is_empty() {
            return Err(fail(CompilationFault::EmptyVariant));
        }
        if !elements.contains(&Element::Group) {
            return Err(fail(CompilationFault::NoGroup));
        }
        if elements
            .windows(2)
            .any(|w| w[0] == Element::Group && w[1] == Element::Group)
        {
            return Err(fail(CompilationFault::AdjacentGroups));
        }
        let mut matchers = Vec::with_capacity(elements.len());
        for element in elements {
            let matcher = match element {
                Element::Group => Matcher::Group,
                Element::Gap => Matcher::Gap,
                Element::Arrow => Matcher::Arrow,
                Element::Of => Matcher::Literal("of"),
                Element::Trigger => {
                    Matcher::Word(compile_vocabulary(spec.triggers, "trigger").map_err(fail)?)
                }
                Element::Transition => Matcher::Word(
                    compile_vocabulary(spec.transitions, "transition").map_err(fail)?,
                ),
            };
            matchers.push(matcher);
        }
        Ok(Self {
            family: spec.family,
            variant,
            matchers: matchers.into_boxed_slice(),
        })
    }

    /// Tries every start position and returns the groups of each match, left to right.
    #[cfg(test)]
    pub(crate) fn find_all<'s>(&self, segments: &'s [Segment]) -> Vec<Vec<&'s EntityListSpan>> {
        (0..segments.len())
            .filter_map(|start| self.match_at(segments, start))
            .collect()
    }

    /// Matches the template at `start` and returns the matched groups.
    pub(crate) fn match_at<'s>(
        &self,
        segments: &'s [Segment],
        start: usize,
    ) -> Option<Vec<&'s EntityListSpan>> {
        let mut cursor = start;
        let mut groups = Vec::new();
        for matcher in self.matchers.iter() {
            match (matcher, segments.get(cursor)?) {
                (Matcher::Group, Segment::Group(span)) => groups.push(span),
                (Matcher::Word(words), Segment::Word(word)) if words.matches(word) => (),
                (Matcher::Literal(literal), Segment::Word(word)) if *literal == word.as_str() => (),
                (Matcher::Gap, Segment::Word(word)) if is_plain_word(word) => (),
                (Matcher::Arrow, Segment::Word(word)) if is_arrow(word) => {
                    // An arrow may have been split by the tokenizer, as in `<- ->`.
                    while segments
                        .get(cursor + 1)
                        .is_some_and(|s| matches!(s, Segment::Word(w) if is_arrow(w)))
                    {
                        cursor += 1;
                    }
                }
                _ => return None,
            }
            cursor += 1;
        }
        Some(groups)
    }
}

fn compile_vocabulary(
    vocabulary: Option<Vocabulary>,
    role: &'static str,
) -> Result<WordMatcher, CompilationFault> {
    let vocabulary = vocabulary.ok_or(CompilationFault::MissingVocabulary(role))?;
    WordMatcher::compile(&vocabulary, role)
}

/// Compiled pattern families, in declared order. Use [`registry`] to get the process-wide
/// instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRegistry {
    families: Vec<(PatternFamily, Vec<PatternTemplate>)>,
}

impl PatternRegistry {
    pub(crate) fn compile(specs: &[FamilySpec]) -> Result<Self, PatternCompilationError> {
        let families = specs
            .iter()
            .map(|spec| {
                let templates = (0..spec.variants.len())
                    .map(|variant| PatternTemplate::compile(spec, variant))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((spec.family, templates))
            })
            .collect::<Result<Vec<_>, PatternCompilationError>>()?;
        Ok(Self { families })
    }

    /// Builds a fresh registry from the built-in family table.
    pub fn build() -> Result<Self, PatternCompilationError> {
        Self::compile(&FAMILIES)
    }

    pub fn families(&self) -> impl Iterator<Item = (PatternFamily, &[PatternTemplate])> {
        self.families.iter().map(|(f, t)| (*f, t.as_slice()))
    }

    pub fn templates(&self, family: PatternFamily) -> &[PatternTemplate] {
        self.families
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, t)| t.as_slice())
            .unwrap_or_default()
    }
}

static REGISTRY: OnceLock<Result<PatternRegistry, PatternCompilationError>> = OnceLock::new();

/// Process-wide pattern registry. It is compiled on first access (exactly once, even under
/// concurrent first use) and read-only afterwards.
pub fn registry() -> Result<&'static PatternRegistry, PatternCompilationError> {
    REGISTRY
        .get_or_init(PatternRegistry::build)
        .as_ref()
        .map_err(Clone::clone)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grouper::group;
    use crate::normalizer::{IdentityStemmer, NormalizedSentence};
    use rstest::rstest;

    #[test]
    fn test_builtin_families_compile() {
        let registry = registry().unwrap();
        let counts: Vec<usize> = registry.families().map(|(_, t)| t.len()).collect();
        assert_eq!(counts, vec![1, 4, 8, 2, 1, 4]);
        assert!(std::ptr::eq(registry, super::registry().unwrap()));
    }

    #[test]
    fn test_registry_is_built_once_under_concurrency() {
        let addresses: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry().unwrap() as *const PatternRegistry as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    }

    const EMPTY: [(&str, &str); 0] = [];
    const BAD: [(&str, &str); 1] = [("Convert", "conver")];

    #[rstest]
    #[case(FamilySpec {
        family: PatternFamily::Yield,
        triggers: None,
        transitions: None,
        variants: &[&[Element::Group, Element::Trigger, Element::Group]],
    }, CompilationFault::MissingVocabulary("trigger"))]
    #[case(FamilySpec {
        family: PatternFamily::Yield,
        triggers: Some(Vocabulary { entries: &EMPTY, matching: Matching::Prefix }),
        transitions: None,
        variants: &[&[Element::Group, Element::Trigger, Element::Group]],
    }, CompilationFault::EmptyVocabulary("trigger"))]
    #[case(FamilySpec {
        family: PatternFamily::NominalOf,
        triggers: Some(Vocabulary { entries: &BAD, matching: Matching::Prefix }),
        transitions: None,
        variants: &[&[Element::Trigger, Element::Of, Element::Group]],
    }, CompilationFault::InvalidEntry(String::from("Convert")))]
    #[case(FamilySpec {
        family: PatternFamily::Equilibrium,
        triggers: None,
        transitions: None,
        variants: &[&[Element::Arrow]],
    }, CompilationFault::NoGroup)]
    #[case(FamilySpec {
        family: PatternFamily::Equilibrium,
        triggers: None,
        transitions: None,
        variants: &[&[Element::Group, Element::Group]],
    }, CompilationFault::AdjacentGroups)]
    #[case(FamilySpec {
        family: PatternFamily::Equilibrium,
        triggers: None,
        transitions: None,
        variants: &[&[]],
    }, CompilationFault::EmptyVariant)]
    fn test_misconfigured_families(#[case] spec: FamilySpec, #[case] fault: CompilationFault) {
        let error = PatternRegistry::compile(&[spec]).unwrap_err();
        assert_eq!(error.fault, fault);
        assert_eq!(error.family, spec.family);
        assert_eq!(error.variant, 0);
    }

    #[rstest]
    #[case(Matching::Prefix, "conversion", true)]
    #[case(Matching::Prefix, "interconvers", false)]
    #[case(Matching::Exact, "ar", true)]
    #[case(Matching::Exact, "are", true)]
    #[case(Matching::Exact, "area", false)]
    fn test_word_matcher(#[case] matching: Matching, #[case] word: &str, #[case] expected: bool) {
        const ENTRIES: [(&str, &str); 2] = [("convert", "conver"), ("are", "ar")];
        let vocabulary = Vocabulary {
            entries: &ENTRIES,
            matching,
        };
        let matcher = WordMatcher::compile(&vocabulary, "trigger").unwrap();
        assert_eq!(matcher.matches(word), expected)
    }

    #[rstest]
    #[case("<-->", true)]
    #[case("->", true)]
    #[case("-", true)]
    #[case("<=>", false)]
    #[case("", false)]
    fn test_arrows(#[case] word: &str, #[case] expected: bool) {
        assert_eq!(is_arrow(word), expected)
    }

    #[test]
    fn test_split_arrow_is_one_anchor() {
        let sentence = group(&NormalizedSentence::from_marked(
            "$maltose$ <- -> $trehalose$",
            &IdentityStemmer,
        ));
        let template = &registry().unwrap().templates(PatternFamily::Equilibrium)[0];
        let matches = template.find_all(sentence.segments());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].len(), 2);
    }

    #[test]
    fn test_gap_accepts_a_single_plain_word() {
        let template = &registry().unwrap().templates(PatternFamily::Yield)[1];
        let one_gap = group(&NormalizedSentence::from_marked(
            "$A$ yield the $B$",
            &IdentityStemmer,
        ));
        let two_gaps = group(&NormalizedSentence::from_marked(
            "$A$ yield the pure $B$",
            &IdentityStemmer,
        ));
        let punctuation = group(&NormalizedSentence::from_marked(
            "$A$ yield ( $B$",
            &IdentityStemmer,
        ));
        assert_eq!(template.find_all(one_gap.segments()).len(), 1);
        assert!(template.find_all(two_gaps.segments()).is_empty());
        assert!(template.find_all(punctuation.segments()).is_empty());
    }
}
