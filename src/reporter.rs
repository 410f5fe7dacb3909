/*!
This modules gives a few tools to prettyprint the outcome of an evaluation: the bucket counts, the
overall metrics and the precision of every pattern family.
*/
use crate::metrics::{Confusion, Score};
use crate::patterns::PatternFamily;
use crate::scorer::OutcomeBucket;
use enum_iterator::all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// The reporter holds the bucket counts, the overall metrics and the metrics of every pattern
/// family. When displayed, it acts as a small dataframe. It is built with `Evaluation::report`.
///
/// # Example
///
/// ```rust
/// use rxnev::{evaluate_conf, DefaultRxnevConfig, GroundTruthReaction, InMemoryStore,
///             MapResolver, PorterStemmer, TaggedSentence};
///
/// let sentences = vec![
///     TaggedSentence::new("s1", "serine <--> glycine", ["serine", "glycine"]),
///     TaggedSentence::new("s2", "nothing to see here", Vec::<String>::new()),
/// ];
/// let store: InMemoryStore = [("s1", GroundTruthReaction::new(["C1"], ["C2"]))]
///     .into_iter()
///     .collect();
/// let resolver: MapResolver = [("serine", "C1"), ("glycine", "C2")].into_iter().collect();
///
/// let evaluation = evaluate_conf(
///     &sentences,
///     &store,
///     &resolver,
///     &PorterStemmer::new(),
///     DefaultRxnevConfig::default(),
/// )
/// .unwrap();
/// let expected_report = "Bucket, Count
/// TruePositive, 1
/// TruePositiveMiss, 0
/// FalsePositive, 0
/// FalseNegative, 0
/// TrueNegative, 1
/// Metric, Score
/// Precision, 1
/// Recall, 1
/// Fscore, 1
/// Accuracy, 1
/// Family, Precision, Wins, Support
/// Overall_Weighted, 1, 1, 1
/// Overall_Macro, 1, 1, 1
/// Equilibrium, 1, 1, 1
/// TriggerFirst, undefined, 0, 0
/// TriggerInline, undefined, 0, 0
/// Yield, undefined, 0, 0
/// NominalOf, undefined, 0, 0
/// ProductOf, undefined, 0, 0\n";
///
/// assert_eq!(expected_report, evaluation.report(Default::default()).to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Reporter {
    pub(crate) confusion: Confusion,
    pub(crate) overall: OverallMetrics,
    /// One line per family, in declared order.
    pub(crate) families: Vec<FamilyMetrics>,
    /// Weighted, then macro average.
    pub(crate) averages: Vec<FamilyMetrics>,
}

impl Reporter {
    pub fn confusion(&self) -> Confusion {
        self.confusion
    }
    pub fn overall(&self) -> OverallMetrics {
        self.overall
    }
    pub fn families(&self) -> &[FamilyMetrics] {
        &self.families
    }
    pub fn averages(&self) -> &[FamilyMetrics] {
        &self.averages
    }
    pub fn family(&self, family: PatternFamily) -> Option<&FamilyMetrics> {
        self.families.iter().find(|f| f.family == Some(family))
    }
}

/// By converting the reporter into a `HashSet` of `FamilyMetrics`, you lose the ordering of the
/// lines. If you mean to consume the data without prettyprinting it, this is not a problem.
impl From<Reporter> for HashSet<FamilyMetrics> {
    fn from(value: Reporter) -> Self {
        value
            .averages
            .into_iter()
            .chain(value.families)
            .collect()
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Bucket, Count")?;
        for bucket in all::<OutcomeBucket>() {
            writeln!(f, "{}, {}", bucket, self.confusion.count(bucket))?
        }
        writeln!(f, "Metric, Score")?;
        writeln!(f, "Precision, {}", self.overall.precision)?;
        writeln!(f, "Recall, {}", self.overall.recall)?;
        writeln!(f, "Fscore, {}", self.overall.fscore)?;
        writeln!(f, "Accuracy, {}", self.overall.accuracy)?;
        writeln!(f, "Family, Precision, Wins, Support")?;
        for line in self.averages.iter().chain(self.families.iter()) {
            writeln!(f, "{}", line)?
        }
        Ok(())
    }
}

/// Metrics computed over the whole corpus.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct OverallMetrics {
    pub precision: Score,
    pub recall: Score,
    pub fscore: Score,
    pub accuracy: Score,
}

/// Precision of a pattern family: the share of the sentences where the family extracted a
/// candidate that turned into a true positive won by this family.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FamilyMetrics {
    /// Name of the family, or of the average.
    pub label: String,
    /// `None` for the averages.
    pub family: Option<PatternFamily>,
    /// The average used to compute this line
    pub average: Average,
    pub precision: Score,
    /// True positives won by the family
    pub wins: usize,
    /// Sentences where the family extracted a candidate
    pub support: usize,
}

impl Hash for FamilyMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.average.hash(state)
    }
}

impl PartialEq for FamilyMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.average == other.average
    }
}
impl Eq for FamilyMetrics {}

/// The FamilyMetrics struct acts as a line in a dataframe when displayed.
impl Display for FamilyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.label, self.precision, self.wins, self.support
        )
    }
}

/// Enumeration of the averages computed over the families. &str can be parsed to create an
/// `Average`.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Average {
    /// A single family, no average.
    None,
    Macro,
    Weighted,
}

impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::None => "None",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("impossible to parse the string ({0}) into an Average")]
pub struct AverageParsingError(pub String);

impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Average::None),
            "macro" | "overall_macro" => Ok(Average::Macro),
            "weighted" | "overall_weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}
