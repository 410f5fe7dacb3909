/*!
Static definition of the six pattern families. Every family is a list of variants (tried in the
declared order) built from the same anchors; the variants only differ by the wildcard gaps they
accept between the anchors.
*/
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Textual cue a candidate was extracted with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
pub enum PatternFamily {
    /// `group <--> group`
    Equilibrium,
    /// `[trigger] group [transition] group`, as in "conversion of A to B".
    TriggerFirst,
    /// `group [trigger] [transition] group`, as in "A is converted to B".
    TriggerInline,
    /// `group [yield] group`
    Yield,
    /// `[trigger] of group`, as in "interconversion of A and B".
    NominalOf,
    /// `group [transition] [trigger] group`, as in "A is the product of B".
    ProductOf,
}

impl PatternFamily {
    /// Numeric id of the family, from 0 to 5.
    pub fn id(self) -> u8 {
        match self {
            Self::Equilibrium => 0,
            Self::TriggerFirst => 1,
            Self::TriggerInline => 2,
            Self::Yield => 3,
            Self::NominalOf => 4,
            Self::ProductOf => 5,
        }
    }
    pub fn from_id(id: u8) -> Option<Self> {
        enum_iterator::all::<Self>().find(|f| f.id() == id)
    }
}

impl Display for PatternFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("impossible to parse `{0}` into a pattern family")]
pub struct PatternFamilyParsingError(pub String);

/// Accepts the name of the family (case-insensitive) or its numeric id.
impl FromStr for PatternFamily {
    type Err = PatternFamilyParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<u8>() {
            return Self::from_id(id).ok_or_else(|| PatternFamilyParsingError(s.to_string()));
        }
        enum_iterator::all::<Self>()
            .find(|f| f.to_string().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PatternFamilyParsingError(s.to_string()))
    }
}

/// Building block of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Element {
    /// An entity list span.
    Group,
    /// A word of the trigger vocabulary of the family.
    Trigger,
    /// A word of the transition vocabulary of the family.
    Transition,
    /// The literal word `of`.
    Of,
    /// Exactly one plain word.
    Gap,
    /// An arrow made of `<`, `-` and `>`, such as `<-->` or `->`.
    Arrow,
}

/// How a normalized word is compared against the stems of a vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Matching {
    /// The word starts with the stem (`conversion` is a `conver`...).
    Prefix,
    /// The word is either the stem or the dictionary form.
    Exact,
}

/// Vocabulary entries are `(dictionary form, stem)` pairs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Vocabulary {
    pub(crate) entries: &'static [(&'static str, &'static str)],
    pub(crate) matching: Matching,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FamilySpec {
    pub(crate) family: PatternFamily,
    pub(crate) triggers: Option<Vocabulary>,
    pub(crate) transitions: Option<Vocabulary>,
    pub(crate) variants: &'static [&'static [Element]],
}

const TRIGGER_FIRST_TRIGGERS: [(&str, &str); 13] = [
    ("reduce", "reduc"),
    ("convert", "conver"),
    ("condense", "condens"),
    ("hydrolyze", "hydroly"),
    ("metabolize", "metabol"),
    ("oxidize", "oxid"),
    ("transform", "transform"),
    ("produce", "produc"),
    ("form", "form"),
    ("bioconvert", "bioconver"),
    ("synthesize", "synthes"),
    ("react", "react"),
    ("interconvert", "interconver"),
];

const TRIGGER_INLINE_TRIGGERS: [(&str, &str); 4] = [
    ("convert", "conver"),
    ("oxidize", "oxid"),
    ("produce", "produc"),
    ("interconvert", "interconver"),
];

const YIELD_TRIGGERS: [(&str, &str); 1] = [("yield", "yield")];

const NOMINAL_OF_TRIGGERS: [(&str, &str); 2] =
    [("convert", "conver"), ("interconvert", "interconver")];

const PRODUCT_OF_TRIGGERS: [(&str, &str); 2] =
    [("produce", "produc"), ("metabolite", "metabolit")];

const TRANSITIONS: [(&str, &str); 6] = [
    ("from", "from"),
    ("to", "to"),
    ("into", "into"),
    ("by", "by"),
    ("are", "ar"),
    ("yield", "yield"),
];

const PRODUCT_OF_TRANSITIONS: [(&str, &str); 2] = [("is", "is"), ("are", "ar")];

const fn prefix(entries: &'static [(&'static str, &'static str)]) -> Option<Vocabulary> {
    Some(Vocabulary {
        entries,
        matching: Matching::Prefix,
    })
}

const fn exact(entries: &'static [(&'static str, &'static str)]) -> Option<Vocabulary> {
    Some(Vocabulary {
        entries,
        matching: Matching::Exact,
    })
}

use Element::{Arrow, Gap, Group, Of, Transition, Trigger};

/// The six families, in declared order.
pub(crate) const FAMILIES: [FamilySpec; 6] = [
    FamilySpec {
        family: PatternFamily::Equilibrium,
        triggers: None,
        transitions: None,
        variants: &[&[Group, Arrow, Group]],
    },
    FamilySpec {
        family: PatternFamily::TriggerFirst,
        triggers: prefix(&TRIGGER_FIRST_TRIGGERS),
        transitions: exact(&TRANSITIONS),
        variants: &[
            &[Trigger, Group, Transition, Group],
            &[Trigger, Gap, Group, Transition, Group],
            &[Trigger, Gap, Group, Gap, Transition, Group],
            &[Trigger, Group, Gap, Transition, Group],
        ],
    },
    FamilySpec {
        family: PatternFamily::TriggerInline,
        triggers: prefix(&TRIGGER_INLINE_TRIGGERS),
        transitions: exact(&TRANSITIONS),
        variants: &[
            &[Group, Trigger, Transition, Group],
            &[Group, Gap, Trigger, Transition, Group],
            &[Group, Trigger, Gap, Transition, Group],
            &[Group, Trigger, Transition, Gap, Group],
            &[Group, Gap, Trigger, Gap, Transition, Group],
            &[Group, Trigger, Gap, Transition, Gap, Group],
            &[Group, Gap, Trigger, Transition, Gap, Group],
            &[Group, Gap, Trigger, Gap, Transition, Gap, Group],
        ],
    },
    FamilySpec {
        family: PatternFamily::Yield,
        triggers: prefix(&YIELD_TRIGGERS),
        transitions: None,
        variants: &[&[Group, Trigger, Group], &[Group, Trigger, Gap, Group]],
    },
    FamilySpec {
        family: PatternFamily::NominalOf,
        triggers: prefix(&NOMINAL_OF_TRIGGERS),
        transitions: None,
        variants: &[&[Trigger, Of, Group]],
    },
    FamilySpec {
        family: PatternFamily::ProductOf,
        triggers: prefix(&PRODUCT_OF_TRIGGERS),
        transitions: exact(&PRODUCT_OF_TRANSITIONS),
        variants: &[
            &[Group, Transition, Trigger, Group],
            &[Group, Transition, Gap, Trigger, Group],
            &[Group, Transition, Gap, Trigger, Gap, Group],
            &[Group, Transition, Trigger, Gap, Group],
        ],
    },
];
