use rxnev::{
    evaluate, report_conf, CachedResolver, Confusion, DivByZeroStrat, Extractor,
    GroundTruthReaction, InMemoryStore, MapResolver, Orientation, OutcomeBucket, PatternFamily,
    PorterStemmer, RxnevConfigBuilder, Score, TaggedSentence,
};
use serde::Deserialize;
use serde_jsonlines::json_lines;
use std::collections::HashMap;

#[derive(Deserialize)]
struct Record {
    sentence: TaggedSentence,
    names: HashMap<String, String>,
    reactions: Vec<GroundTruthReaction>,
}

struct Corpus {
    sentences: Vec<TaggedSentence>,
    store: InMemoryStore,
    resolver: MapResolver,
}

fn load_corpus() -> Corpus {
    let records = json_lines::<Record, _>("tests/corpus.jsonl")
        .expect("file corpus.jsonl not found in test directory")
        .map(|r| r.expect("malformed record in corpus.jsonl"))
        .collect::<Vec<_>>();
    let mut sentences = Vec::with_capacity(records.len());
    let mut store = InMemoryStore::new();
    let mut resolver = MapResolver::new();
    for record in records {
        for (name, id) in record.names {
            resolver.insert(&name, id);
        }
        for reaction in record.reactions {
            store.insert(record.sentence.id.clone(), reaction);
        }
        sentences.push(record.sentence);
    }
    Corpus {
        sentences,
        store,
        resolver,
    }
}

fn buckets(corpus: &Corpus, orientation: Orientation, parallel: bool) -> Vec<OutcomeBucket> {
    let extractor = Extractor::default();
    evaluate(
        &corpus.sentences,
        &corpus.store,
        &corpus.resolver,
        &extractor,
        orientation,
        parallel,
    )
    .unwrap()
    .outcomes()
    .iter()
    .map(|o| o.outcome.bucket())
    .collect()
}

#[test]
fn every_sentence_lands_in_its_bucket() {
    let corpus = load_corpus();
    let expected = vec![
        OutcomeBucket::TruePositive,
        OutcomeBucket::TruePositiveMiss,
        OutcomeBucket::FalsePositive,
        OutcomeBucket::FalseNegative,
        OutcomeBucket::TrueNegative,
        OutcomeBucket::TrueNegative,
        OutcomeBucket::TruePositive,
    ];
    assert_eq!(buckets(&corpus, Orientation::Directed, false), expected);
    assert_eq!(buckets(&corpus, Orientation::Directed, true), expected);
}

#[test]
fn reversed_reactions_count_when_orientation_is_ignored() {
    let corpus = load_corpus();
    let actual = buckets(&corpus, Orientation::Either, false);
    assert_eq!(actual[1], OutcomeBucket::TruePositive);
}

#[test]
fn report_of_the_fixture_corpus() {
    let corpus = load_corpus();
    let config = RxnevConfigBuilder::default()
        .division_by_zero(DivByZeroStrat::ReplaceBy0)
        .parallel(true)
        .build();
    let reporter = report_conf(
        &corpus.sentences,
        &corpus.store,
        &corpus.resolver,
        PorterStemmer::new(),
        config,
    )
    .unwrap();

    assert_eq!(reporter.confusion(), Confusion::new(2, 1, 1, 1, 2));
    let overall = reporter.overall();
    assert_eq!(overall.precision, Score::Defined(0.5));
    assert_eq!(overall.recall, Score::Defined(0.5));
    assert_eq!(overall.fscore, Score::Defined(0.5));

    let expected = [
        (PatternFamily::Equilibrium, Score::Defined(0.0), 0, 1),
        (PatternFamily::TriggerFirst, Score::Defined(1.0), 1, 1),
        (PatternFamily::TriggerInline, Score::Defined(0.0), 0, 1),
        (PatternFamily::Yield, Score::Defined(1.0), 1, 1),
        (PatternFamily::NominalOf, Score::Defined(0.0), 0, 0),
        (PatternFamily::ProductOf, Score::Defined(0.0), 0, 0),
    ];
    for (family, precision, wins, support) in expected {
        let line = reporter.family(family).unwrap();
        assert_eq!(line.precision, precision, "{}", family);
        assert_eq!(line.wins, wins, "{}", family);
        assert_eq!(line.support, support, "{}", family);
    }
    let weighted = &reporter.averages()[0];
    assert_eq!(weighted.precision, Score::Defined(0.5));
    assert_eq!(weighted.support, 4);
    // Families that never fired are left out of the macro average.
    let macro_average = &reporter.averages()[1];
    assert_eq!(macro_average.precision, Score::Defined(0.5));
}

#[test]
fn cached_resolver_is_a_drop_in_replacement() {
    let corpus = load_corpus();
    let cached = CachedResolver::new(corpus.resolver.clone());
    let extractor = Extractor::default();
    let evaluation = evaluate(
        &corpus.sentences,
        &corpus.store,
        &cached,
        &extractor,
        Orientation::Directed,
        false,
    )
    .unwrap();
    assert_eq!(evaluation.confusion(), Confusion::new(2, 1, 1, 1, 2));
    assert!(cached.cached() > 0);
}

#[test]
fn every_clause_of_a_sentence_is_extracted() {
    let sentences = vec![TaggedSentence::new(
        "s1",
        "Serine is converted to glycine ; alanine is converted into the pyruvate",
        ["Serine", "glycine", "alanine", "pyruvate"],
    )];
    let store: InMemoryStore = [("s1", GroundTruthReaction::new(["C3"], ["C4"]))]
        .into_iter()
        .collect();
    let resolver: MapResolver = [
        ("serine", "C1"),
        ("glycine", "C2"),
        ("alanine", "C3"),
        ("pyruvate", "C4"),
    ]
    .into_iter()
    .collect();
    let evaluation = evaluate(
        &sentences,
        &store,
        &resolver,
        &Extractor::default(),
        Orientation::Directed,
        false,
    )
    .unwrap();
    assert_eq!(
        evaluation.outcomes()[0].outcome.bucket(),
        OutcomeBucket::TruePositive
    );
}
