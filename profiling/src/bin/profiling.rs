use rxnev::{
    report_conf, DivByZeroStrat, GroundTruthReaction, InMemoryStore, MapResolver, Orientation,
    PorterStemmer, RxnevConfigBuilder, TaggedSentence,
};
use serde::Deserialize;
use serde_jsonlines::json_lines;
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use clap::Parser;

/// One line of the corpus: the tagged sentence, the identifiers of its chemical names and its
/// known reactions.
#[derive(Deserialize)]
struct Record {
    sentence: TaggedSentence,
    #[serde(default)]
    names: HashMap<String, String>,
    #[serde(default)]
    reactions: Vec<GroundTruthReaction>,
}

struct Corpus {
    sentences: Vec<TaggedSentence>,
    store: InMemoryStore,
    resolver: MapResolver,
}

impl Corpus {
    fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut corpus = Corpus {
            sentences: vec![],
            store: InMemoryStore::new(),
            resolver: MapResolver::new(),
        };
        for record in json_lines::<Record, P>(path)? {
            let record = record?;
            for (name, id) in record.names {
                corpus.resolver.insert(&name, id);
            }
            for reaction in record.reactions {
                corpus.store.insert(record.sentence.id.clone(), reaction);
            }
            corpus.sentences.push(record.sentence);
        }
        Ok(corpus)
    }
}

#[derive(Debug, Parser)]
struct Args {
    #[arg(short, long, default_value_t = 1)]
    n_samples: u32,
    #[arg(short, long, default_value_t=String::from("big"))]
    dataset: String,
    /// Accept reactions extracted in the reverse direction
    #[arg(long, default_value_t = false)]
    undirected: bool,
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// undefined, replaceby0 or replaceby1
    #[arg(short, long, default_value_t=String::from("undefined"))]
    zero_division: String,
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let n_samples = args.n_samples;
    let iter = Range {
        start: 0,
        end: n_samples,
    };
    let orientation = if args.undirected {
        Orientation::Either
    } else {
        Orientation::Directed
    };
    let zero_division: DivByZeroStrat = args
        .zero_division
        .parse()
        .map_err(std::io::Error::other)?;
    let mut total_duration = Duration::ZERO;
    let path = format!("./data/datasets/{}_dataset.jsonl", args.dataset);
    let corpus = Corpus::load(&path)?;
    let mut last_report = None;
    for _ in iter {
        let config = RxnevConfigBuilder::default()
            .division_by_zero(zero_division)
            .orientation(orientation)
            .parallel(args.parallel)
            .build();
        let now = Instant::now();
        let reporter = report_conf(
            &corpus.sentences,
            &corpus.store,
            &corpus.resolver,
            PorterStemmer::new(),
            config,
        )
        .map_err(std::io::Error::other)?;
        total_duration += now.elapsed();
        last_report = Some(reporter);
    }
    if let Some(reporter) = last_report {
        println!("{}", reporter);
    }
    println!(
        "Total duration: {} with {n_samples} samples",
        total_duration.as_secs_f64()
    );
    Ok(())
}
