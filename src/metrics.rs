/*!
Corpus evaluation: every sentence is extracted, scored and tallied into a confusion matrix, from
which precision, recall, F-score and accuracy are computed. Sentences are independent, so the
evaluation can run on several cores; each worker keeps its own tally and the tallies are merged
afterwards, in corpus order.
*/
use crate::datastructure::TaggedSentence;
use crate::normalizer::Stemmer;
use crate::patterns::{
    registry, Extractor, PatternCompilationError, PatternFamily, PatternRegistry,
};
use crate::reporter::{Average, FamilyMetrics, OverallMetrics, Reporter};
use crate::resolver::IdentifierResolver;
use crate::scorer::{GroundTruthStore, Orientation, Outcome, OutcomeBucket, Scorer};
use enum_iterator::{all, cardinality};
use itertools::Itertools;
use ndarray::{Array1, ArrayView1, Zip};
use ndarray_stats::SummaryStatisticsExt;
use num::Float;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// What to report when a metric has a zero denominator, for example the precision of a corpus
/// where nothing was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DivByZeroStrat {
    /// Report the metric as undefined.
    #[default]
    Undefined,
    /// Report 0.
    ReplaceBy0,
    /// Report 1.
    ReplaceBy1,
}

impl DivByZeroStrat {
    fn on_zero(self) -> Score {
        match self {
            Self::Undefined => Score::Undefined,
            Self::ReplaceBy0 => Score::Defined(0.0),
            Self::ReplaceBy1 => Score::Defined(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse `{0}` into a `DivByZeroStrat`")]
pub struct ParsingDivByZeroStratError(pub String);

impl FromStr for DivByZeroStrat {
    type Err = ParsingDivByZeroStratError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_ref() {
            "undefined" | "none" => Ok(DivByZeroStrat::Undefined),
            "replaceby0" | "replacebyzero" | "zero" => Ok(DivByZeroStrat::ReplaceBy0),
            "replaceby1" | "replacebyone" | "one" => Ok(DivByZeroStrat::ReplaceBy1),
            _ => Err(ParsingDivByZeroStratError(String::from(s))),
        }
    }
}

/// Value of a metric. A metric with a zero denominator is `Undefined`, unless a `DivByZeroStrat`
/// replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Score {
    Defined(f32),
    Undefined,
}

impl Score {
    pub fn value(self) -> Option<f32> {
        match self {
            Score::Defined(v) => Some(v),
            Score::Undefined => None,
        }
    }
    pub fn is_defined(self) -> bool {
        matches!(self, Score::Defined(_))
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Score::Defined(v) => write!(f, "{}", v),
            Score::Undefined => write!(f, "undefined"),
        }
    }
}

fn divide(numerator: usize, denominator: usize, metric: &str, strat: DivByZeroStrat) -> Score {
    if denominator == 0 {
        warn!(metric, ?strat, "zero denominator");
        strat.on_zero()
    } else {
        Score::Defined(numerator as f32 / denominator as f32)
    }
}

/// Number of sentences in each outcome bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Confusion {
    pub true_positive: usize,
    pub true_positive_miss: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_negative: usize,
}

impl Confusion {
    pub fn new(
        true_positive: usize,
        true_positive_miss: usize,
        false_positive: usize,
        false_negative: usize,
        true_negative: usize,
    ) -> Self {
        Self {
            true_positive,
            true_positive_miss,
            false_positive,
            false_negative,
            true_negative,
        }
    }

    pub fn record(&mut self, bucket: OutcomeBucket) {
        *self.count_mut(bucket) += 1
    }

    pub fn count(&self, bucket: OutcomeBucket) -> usize {
        match bucket {
            OutcomeBucket::TruePositive => self.true_positive,
            OutcomeBucket::TruePositiveMiss => self.true_positive_miss,
            OutcomeBucket::FalsePositive => self.false_positive,
            OutcomeBucket::FalseNegative => self.false_negative,
            OutcomeBucket::TrueNegative => self.true_negative,
        }
    }

    fn count_mut(&mut self, bucket: OutcomeBucket) -> &mut usize {
        match bucket {
            OutcomeBucket::TruePositive => &mut self.true_positive,
            OutcomeBucket::TruePositiveMiss => &mut self.true_positive_miss,
            OutcomeBucket::FalsePositive => &mut self.false_positive,
            OutcomeBucket::FalseNegative => &mut self.false_negative,
            OutcomeBucket::TrueNegative => &mut self.true_negative,
        }
    }

    /// Number of sentences, all buckets included.
    pub fn total(&self) -> usize {
        all::<OutcomeBucket>().map(|b| self.count(b)).sum()
    }

    /// TP / (TP + TPMiss + FP)
    pub fn precision(&self, strat: DivByZeroStrat) -> Score {
        divide(
            self.true_positive,
            self.true_positive + self.true_positive_miss + self.false_positive,
            "precision",
            strat,
        )
    }

    /// TP / (TP + TPMiss + FN)
    pub fn recall(&self, strat: DivByZeroStrat) -> Score {
        divide(
            self.true_positive,
            self.true_positive + self.true_positive_miss + self.false_negative,
            "recall",
            strat,
        )
    }

    /// Harmonic mean of the precision and the recall.
    pub fn fscore(&self, strat: DivByZeroStrat) -> Score {
        match (self.precision(strat).value(), self.recall(strat).value()) {
            (Some(p), Some(r)) if p + r > 0.0 => Score::Defined(2.0 * p * r / (p + r)),
            (Some(_), Some(_)) => {
                warn!(metric = "fscore", ?strat, "zero denominator");
                strat.on_zero()
            }
            _ => Score::Undefined,
        }
    }

    /// (TP + TN) / total
    pub fn accuracy(&self, strat: DivByZeroStrat) -> Score {
        divide(
            self.true_positive + self.true_negative,
            self.total(),
            "accuracy",
            strat,
        )
    }
}

impl AddAssign for Confusion {
    fn add_assign(&mut self, rhs: Self) {
        for bucket in all::<OutcomeBucket>() {
            *self.count_mut(bucket) += rhs.count(bucket)
        }
    }
}

impl Add for Confusion {
    type Output = Confusion;
    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl FromIterator<OutcomeBucket> for Confusion {
    fn from_iter<T: IntoIterator<Item = OutcomeBucket>>(iter: T) -> Self {
        let mut confusion = Confusion::default();
        for bucket in iter {
            confusion.record(bucket)
        }
        confusion
    }
}

/// Outcome of one sentence of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceOutcome {
    pub id: String,
    pub outcome: Outcome,
    /// Families that extracted at least one candidate from the sentence.
    pub families: Vec<PatternFamily>,
}

/// Per-family counts, indexed by family id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FamilyTally {
    /// Sentences where the family extracted a candidate.
    pub(crate) support: Array1<usize>,
    /// True positives won by a candidate of the family.
    pub(crate) wins: Array1<usize>,
}

impl Default for FamilyTally {
    fn default() -> Self {
        let n = cardinality::<PatternFamily>();
        Self {
            support: Array1::zeros(n),
            wins: Array1::zeros(n),
        }
    }
}

impl FamilyTally {
    fn record(&mut self, outcome: &SentenceOutcome) {
        for family in outcome.families.iter() {
            self.support[family.id() as usize] += 1;
        }
        if let Outcome::TruePositive { candidate, .. } = &outcome.outcome {
            self.wins[candidate.family().id() as usize] += 1;
        }
    }
    fn merge(&mut self, other: &FamilyTally) {
        self.support += &other.support;
        self.wins += &other.wins;
    }
}

/// Result of a corpus evaluation: the outcome of every sentence, in corpus order, and the
/// aggregated counts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    outcomes: Vec<SentenceOutcome>,
    confusion: Confusion,
    families: FamilyTally,
}

impl Evaluation {
    pub fn outcomes(&self) -> &[SentenceOutcome] {
        &self.outcomes
    }
    pub fn confusion(&self) -> Confusion {
        self.confusion
    }
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
    /// Number of sentences where `family` extracted a candidate.
    pub fn family_support(&self, family: PatternFamily) -> usize {
        self.families.support[family.id() as usize]
    }
    /// Number of true positives won by a candidate of `family`.
    pub fn family_wins(&self, family: PatternFamily) -> usize {
        self.families.wins[family.id() as usize]
    }

    pub(crate) fn push(&mut self, outcome: SentenceOutcome) {
        self.confusion.record(outcome.outcome.bucket());
        self.families.record(&outcome);
        self.outcomes.push(outcome);
    }

    /// Appends `other` (the tally of the sentences following those of `self`).
    pub(crate) fn merge(mut self, other: Evaluation) -> Self {
        self.confusion += other.confusion;
        self.families.merge(&other.families);
        self.outcomes.extend(other.outcomes);
        self
    }

    /// Computes every metric and packs them into a `Reporter`.
    pub fn report(&self, zero_division: DivByZeroStrat) -> Reporter {
        let overall = OverallMetrics {
            precision: self.confusion.precision(zero_division),
            recall: self.confusion.recall(zero_division),
            fscore: self.confusion.fscore(zero_division),
            accuracy: self.confusion.accuracy(zero_division),
        };
        let (families, averages) = family_metrics(&self.families, zero_division);
        Reporter {
            confusion: self.confusion,
            overall,
            families,
            averages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    PatternCompilation(#[from] PatternCompilationError),
}

/// Divides `numerator` by `denominator`, element-wise. Zero denominators are replaced by one and
/// flagged in the returned mask (`false` where the denominator was zero).
fn prf_divide_and_mask<F: Float>(
    numerator: ArrayView1<F>,
    denominator: ArrayView1<F>,
) -> (Array1<F>, Array1<bool>) {
    let mask = denominator.mapv(|d| d != F::zero());
    let result = Zip::from(&numerator)
        .and(&denominator)
        .map_collect(|n, d| if *d == F::zero() { F::zero() } else { *n / *d });
    (result, mask)
}

/// Precision of every family (wins over support), followed by the macro and support-weighted
/// averages.
fn family_metrics(
    tally: &FamilyTally,
    zero_division: DivByZeroStrat,
) -> (Vec<FamilyMetrics>, Vec<FamilyMetrics>) {
    let wins = tally.wins.mapv(|v| v as f32);
    let support = tally.support.mapv(|v| v as f32);
    let (precision, defined) = prf_divide_and_mask(wins.view(), support.view());
    let families: Vec<FamilyMetrics> = all::<PatternFamily>()
        .map(|family| {
            let i = family.id() as usize;
            let score = if defined[i] {
                Score::Defined(precision[i])
            } else {
                zero_division.on_zero()
            };
            FamilyMetrics {
                label: family.to_string(),
                family: Some(family),
                average: Average::None,
                precision: score,
                wins: tally.wins[i],
                support: tally.support[i],
            }
        })
        .collect();

    let total_wins = tally.wins.sum();
    let total_support = tally.support.sum();
    // Families that never fired have no precision to average, whatever the strategy.
    let defined_scores: Array1<f32> = Zip::from(&precision)
        .and(&defined)
        .fold(Vec::new(), |mut scores, p, d| {
            if *d {
                scores.push(*p);
            }
            scores
        })
        .into();
    let macro_precision = match defined_scores.mean() {
        Some(mean) => Score::Defined(mean),
        None => {
            warn!(metric = "macro precision", ?zero_division, "no family to average");
            zero_division.on_zero()
        }
    };
    let weighted_precision = match precision.weighted_mean(&support) {
        Ok(mean) if total_support > 0 => Score::Defined(mean),
        _ => {
            warn!(metric = "weighted precision", ?zero_division, "zero total support");
            zero_division.on_zero()
        }
    };
    let averages = [
        (Average::Weighted, weighted_precision),
        (Average::Macro, macro_precision),
    ]
    .into_iter()
    .map(|(average, precision)| FamilyMetrics {
        label: average.to_string(),
        family: None,
        average,
        precision,
        wins: total_wins,
        support: total_support,
    })
    .collect_vec();
    (families, averages)
}

fn evaluate_sentence<St, R, G>(
    sentence: &TaggedSentence,
    registry: &PatternRegistry,
    extractor: &Extractor<St>,
    scorer: &Scorer<'_, R>,
    store: &G,
) -> SentenceOutcome
where
    St: Stemmer,
    R: IdentifierResolver + ?Sized,
    G: GroundTruthStore + ?Sized,
{
    let candidates = extractor.extract_with(registry, sentence);
    let families = candidates.iter().map(|c| c.family()).dedup().collect();
    let outcome = scorer.score(candidates, store.reactions(&sentence.id));
    SentenceOutcome {
        id: sentence.id.clone(),
        outcome,
        families,
    }
}

/// Evaluates a whole corpus. Every sentence is extracted with `extractor`, its mentions resolved
/// with `resolver` and its candidates compared with the reactions of `store`.
///
/// * `sentences`: The tagged corpus
/// * `store`: Ground-truth reactions, keyed by sentence id
/// * `resolver`: Mention to identifier resolution
/// * `extractor`: Extraction pipeline (stemmer and minimum mention length)
/// * `orientation`: Are reversed reactions accepted?
/// * `parallel`: Can we use multiple cores? Sentences are distributed between the workers.
///
/// The only error is the failure to build the pattern registry.
pub fn evaluate<St, R, G>(
    sentences: &[TaggedSentence],
    store: &G,
    resolver: &R,
    extractor: &Extractor<St>,
    orientation: Orientation,
    parallel: bool,
) -> Result<Evaluation, EvaluationError>
where
    St: Stemmer + Sync,
    R: IdentifierResolver + Sync + ?Sized,
    G: GroundTruthStore + Sync + ?Sized,
{
    let registry = registry()?;
    let scorer = Scorer::new(resolver, orientation);
    let evaluation = if parallel {
        sentences
            .par_iter()
            .map(|s| evaluate_sentence(s, registry, extractor, &scorer, store))
            .fold(Evaluation::default, |mut tally, outcome| {
                tally.push(outcome);
                tally
            })
            .reduce(Evaluation::default, Evaluation::merge)
    } else {
        sentences
            .iter()
            .map(|s| evaluate_sentence(s, registry, extractor, &scorer, store))
            .fold(Evaluation::default(), |mut tally, outcome| {
                tally.push(outcome);
                tally
            })
    };
    let confusion = evaluation.confusion();
    info!(
        sentences = evaluation.len(),
        tp = confusion.true_positive,
        tp_miss = confusion.true_positive_miss,
        fp = confusion.false_positive,
        fn_ = confusion.false_negative,
        tn = confusion.true_negative,
        "evaluation done"
    );
    Ok(evaluation)
}
