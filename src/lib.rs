/*!
This library extracts chemical reactions from sentences where the chemical names were already
tagged, and scores the extracted reactions against known (ground-truth) reactions.

# PIPELINE
Every sentence goes through the same steps:
* Normalization: the words are lowercased and stemmed, the tagged mentions are kept verbatim.
    Mentions are substituted longest-first, on whole words only.
* Grouping: mentions joined by list glue (`,`, `and`, `with`) are merged into entity lists, such
    as `A, B and C`.
* Matching: six families of patterns (see `PatternFamily`) are matched against the grouped
    sentence. Each match is a `Candidate`: the family and the matched entity lists.
* Scoring: the mentions of the candidates are resolved into identifiers and compared with the
    ground-truth reactions of the sentence. The sentence falls into one of five outcome buckets.

# Terminology
* A mention is a literal occurrence of a chemical name in a sentence.
* An entity list (or group) is a maximal run of mentions joined by list glue. It is used as a
    single reactant or product unit.
* A subset-match holds when the reactant side of a candidate shares at least one identifier with
    the substrates of a reaction and its product side shares at least one identifier with the
    products.
* The buckets are:
    * TruePositive: a candidate subset-matches a reaction of the sentence.
    * TruePositiveMiss: there are candidates and reactions, but no subset-match.
    * FalsePositive: there are candidates, but the sentence has no reaction.
    * FalseNegative: there is no candidate, but the sentence has a reaction.
    * TrueNegative: no candidate and no reaction.

Precision is `TP / (TP + TPMiss + FP)` and recall is `TP / (TP + TPMiss + FN)`.
*/

mod config;
mod datastructure;
mod expander;
mod grouper;
mod metrics;
mod normalizer;
mod patterns;
mod reporter;
mod resolver;
mod scorer;

// The public api starts here
pub use datastructure::{ChemicalId, ChemicalMention, GroundTruthReaction, TaggedSentence, Token};

pub use normalizer::{
    normalize, IdentityStemmer, NormalizedSentence, PorterStemmer, Stemmer,
    DEFAULT_MIN_MENTION_LEN,
};

pub use grouper::{group, EntityListSpan, GroupedSentence, Segment};

pub use patterns::{
    registry, Candidate, CompilationFault, Extractor, PatternCompilationError, PatternFamily,
    PatternFamilyParsingError, PatternRegistry, PatternTemplate,
};

pub use expander::{expand, strip_sentinels};

pub use resolver::{CachedResolver, IdentifierResolver, MapResolver, ResolutionError};

pub use scorer::{
    GroundTruthStore, InMemoryStore, Orientation, OrientationParsingError, Outcome,
    OutcomeBucket, Scorer,
};

pub use metrics::{
    evaluate, Confusion, DivByZeroStrat, Evaluation, EvaluationError, ParsingDivByZeroStratError,
    Score, SentenceOutcome,
};

pub use reporter::{Average, AverageParsingError, FamilyMetrics, OverallMetrics, Reporter};

pub use config::{DefaultRxnevConfig, RxnevConfig, RxnevConfigBuilder};

/// Extracts the candidate reactions of a sentence, using the default stemmer and minimum mention
/// length. Mentions are the chemical names found in the sentence by a tagger.
///
/// #Example
/// ```rust
/// use rxnev::{extract, PatternFamily};
///
/// let candidates = extract(
///     "Reduction of A and B yielded C and D",
///     &["A", "B", "C", "D"],
///     1,
/// )
/// .unwrap();
/// let yields: Vec<_> = candidates
///     .iter()
///     .filter(|c| c.family() == PatternFamily::Yield)
///     .map(|c| c.expanded())
///     .collect();
/// assert_eq!(yields, vec![vec![vec!["A", "B"], vec!["C", "D"]]]);
/// ```
pub fn extract<S: AsRef<str>>(
    sentence: &str,
    mentions: &[S],
    min_mention_len: usize,
) -> Result<Vec<Candidate>, PatternCompilationError> {
    Extractor::default()
        .with_min_mention_len(min_mention_len)
        .extract_text(sentence, mentions)
}

/// Main entrypoint of the Rxnev library. This function extracts the candidates of every sentence,
/// scores them against the ground truth and returns the outcome of every sentence with the
/// aggregated counts. The returned structure can be used to prettyprint a report. Instead of
/// taking in the raw parameters, this function takes a `RxnevConfig` struct and uses sensible
/// defaults. The division by zero strategy of the config is not used here: it is only needed
/// when reporting (see `report_conf`).
///
/// * `sentences`: Tagged sentences
/// * `store`: Ground-truth reactions of the sentences
/// * `resolver`: Mention to identifier resolution
/// * `stemmer`: Stemmer used during normalization
/// * `config`: Parameters used to extract and score the sentences.
///
/// #Example
/// ```rust
/// use rxnev::{evaluate_conf, DivByZeroStrat, GroundTruthReaction, InMemoryStore, MapResolver,
///             PorterStemmer, RxnevConfigBuilder, Score, TaggedSentence};
///
/// let sentences = vec![TaggedSentence::new(
///     "s1",
///     "The conversion of serine to glycine",
///     ["serine", "glycine"],
/// )];
/// let store: InMemoryStore = [("s1", GroundTruthReaction::new(["C2"], ["C1"]))]
///     .into_iter()
///     .collect();
/// let resolver: MapResolver = [("serine", "C1"), ("glycine", "C2")].into_iter().collect();
/// let config = RxnevConfigBuilder::default()
///     .division_by_zero(DivByZeroStrat::ReplaceBy0)
///     .build();
///
/// let evaluation = evaluate_conf(&sentences, &store, &resolver, PorterStemmer::new(), config)
///     .unwrap();
/// // The reaction goes the other way around.
/// assert_eq!(evaluation.confusion().true_positive_miss, 1);
/// assert_eq!(
///     evaluation.report(DivByZeroStrat::ReplaceBy0).overall().precision,
///     Score::Defined(0.0)
/// );
/// ```
pub fn evaluate_conf<St, R, G, ZeroDiv, Orient>(
    sentences: &[TaggedSentence],
    store: &G,
    resolver: &R,
    stemmer: St,
    config: RxnevConfig<ZeroDiv, Orient>,
) -> Result<Evaluation, EvaluationError>
where
    St: Stemmer + Sync,
    R: IdentifierResolver + Sync + ?Sized,
    G: GroundTruthStore + Sync + ?Sized,
    ZeroDiv: Into<DivByZeroStrat>,
    Orient: Into<Orientation>,
{
    let (_, orientation, min_mention_len, parallel) = config.into();
    let extractor = Extractor::new(stemmer).with_min_mention_len(min_mention_len);
    evaluate(sentences, store, resolver, &extractor, orientation, parallel)
}

/// Evaluates the corpus, then computes the report with the division by zero strategy of `config`.
///
/// #Example
/// ```rust
/// use rxnev::{report_conf, DivByZeroStrat, InMemoryStore, MapResolver, PatternFamily,
///             PorterStemmer, RxnevConfigBuilder, Score, TaggedSentence};
///
/// let sentences = vec![TaggedSentence::new("s1", "serine <--> glycine", ["serine", "glycine"])];
/// let config = RxnevConfigBuilder::default()
///     .division_by_zero(DivByZeroStrat::ReplaceBy0)
///     .build();
/// let reporter = report_conf(
///     &sentences,
///     &InMemoryStore::new(),
///     &MapResolver::new(),
///     PorterStemmer::new(),
///     config,
/// )
/// .unwrap();
/// assert_eq!(reporter.confusion().false_positive, 1);
/// assert_eq!(reporter.overall().recall, Score::Defined(0.0));
/// assert_eq!(reporter.family(PatternFamily::Equilibrium).unwrap().support, 1);
/// ```
pub fn report_conf<St, R, G, ZeroDiv, Orient>(
    sentences: &[TaggedSentence],
    store: &G,
    resolver: &R,
    stemmer: St,
    config: RxnevConfig<ZeroDiv, Orient>,
) -> Result<Reporter, EvaluationError>
where
    St: Stemmer + Sync,
    R: IdentifierResolver + Sync + ?Sized,
    G: GroundTruthStore + Sync + ?Sized,
    ZeroDiv: Into<DivByZeroStrat>,
    Orient: Into<Orientation>,
{
    let (zero_division, orientation, min_mention_len, parallel) = config.into();
    let extractor = Extractor::new(stemmer).with_min_mention_len(min_mention_len);
    let evaluation = evaluate(sentences, store, resolver, &extractor, orientation, parallel)?;
    Ok(evaluation.report(zero_division))
}
