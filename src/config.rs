/*
 * This modules contains some quality of life structs and alias. Most importantly, it contains the
 * `RxnevConfig` struct, which implements the default trait. This config can be passed to the
 * `evaluate_conf` function to simplify its arguments.
*/
use crate::metrics::DivByZeroStrat;
use crate::normalizer::DEFAULT_MIN_MENTION_LEN;
use crate::scorer::Orientation;
use either::Either as LeftOrRight;
use std::fmt::{Debug, Display};

/// Reasonable default configuration when evaluating a corpus.
pub type DefaultRxnevConfig = RxnevConfig<DivByZeroStrat, Orientation>;

impl DefaultRxnevConfig {
    pub fn new() -> Self {
        Self {
            zero_division: DivByZeroStrat::Undefined,
            orientation: None,
            min_mention_len: DEFAULT_MIN_MENTION_LEN,
            parallel: false,
        }
    }
}

impl Default for DefaultRxnevConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl<ZeroDiv, Orient> From<(ZeroDiv, Option<Orient>, usize, bool)> for RxnevConfig<ZeroDiv, Orient>
where
    ZeroDiv: Into<DivByZeroStrat>,
    Orient: Into<Orientation>,
{
    fn from(value: (ZeroDiv, Option<Orient>, usize, bool)) -> Self {
        Self {
            zero_division: value.0,
            orientation: value.1,
            min_mention_len: value.2,
            parallel: value.3,
        }
    }
}

impl<ZeroDiv, Orient> From<RxnevConfigBuilder<ZeroDiv, Orient>>
    for RxnevConfig<DivByZeroStrat, Orientation>
where
    ZeroDiv: Into<DivByZeroStrat>,
    Orient: Into<Orientation>,
{
    fn from(value: RxnevConfigBuilder<ZeroDiv, Orient>) -> Self {
        Self {
            zero_division: value.zero_division.either_into(),
            orientation: value.orientation.map(|o| o.into()),
            min_mention_len: value.min_mention_len,
            parallel: value.parallel,
        }
    }
}

impl<ZeroDiv, Orient> From<RxnevConfig<ZeroDiv, Orient>>
    for (DivByZeroStrat, Orientation, usize, bool)
where
    ZeroDiv: Into<DivByZeroStrat>,
    Orient: Into<Orientation>,
{
    fn from(value: RxnevConfig<ZeroDiv, Orient>) -> Self {
        (
            value.zero_division.into(),
            value.orientation.map(|o| o.into()).unwrap_or_default(),
            value.min_mention_len,
            value.parallel,
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// Config struct used to simplify the inputs of parameters to the main functions of `Rxnev`. It
/// implements the default trait.
pub struct RxnevConfig<ZeroDiv, Orient>
where
    ZeroDiv: Into<DivByZeroStrat>,
    Orient: Into<Orientation>,
{
    /// This parameter describes what to report when a metric has a zero denominator. By default,
    /// such a metric is reported as undefined.
    zero_division: ZeroDiv,
    /// Are the reactions compared in their direction only (the default), or also reversed?
    orientation: Option<Orient>,
    /// Mentions shorter than this number of characters are ignored.
    min_mention_len: usize,
    /// Can we use multiple cores to evaluate the sentences? The sentences are independent, each
    /// worker keeps its own tally.
    parallel: bool,
}

impl<ZeroDiv, Orient> Display for RxnevConfig<ZeroDiv, Orient>
where
    ZeroDiv: Into<DivByZeroStrat> + Debug,
    Orient: Into<Orientation> + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Strategy when encountering a division by zero: {:?}\n Orientation of the reactions: {:?}\n Minimum mention length: {}\n Using parallel computations: {}", self.zero_division, self.orientation, self.min_mention_len, self.parallel);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize a `RxnevConfig` stucture.
pub struct RxnevConfigBuilder<ZeroDiv, Orient>
where
    ZeroDiv: Into<DivByZeroStrat>,
    Orient: Into<Orientation>,
{
    zero_division: LeftOrRight<ZeroDiv, DivByZeroStrat>,
    orientation: Option<Orient>,
    min_mention_len: usize,
    parallel: bool,
}

impl Default for RxnevConfigBuilder<DivByZeroStrat, Orientation> {
    fn default() -> Self {
        Self::new()
    }
}

impl<ZeroDiv, Orient> RxnevConfigBuilder<ZeroDiv, Orient>
where
    ZeroDiv: Into<DivByZeroStrat>,
    Orient: Into<Orientation>,
{
    pub fn division_by_zero(mut self, division_by_zero: ZeroDiv) -> Self {
        self.zero_division = LeftOrRight::Left(division_by_zero);
        self
    }
    pub fn orientation(mut self, orientation: Orient) -> Self {
        self.orientation = Some(orientation);
        self
    }
    pub fn min_mention_len(mut self, min_mention_len: usize) -> Self {
        self.min_mention_len = min_mention_len;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn new() -> Self {
        Self {
            zero_division: LeftOrRight::Right(DivByZeroStrat::Undefined),
            orientation: None,
            min_mention_len: DEFAULT_MIN_MENTION_LEN,
            parallel: false,
        }
    }
    pub fn build(self) -> RxnevConfig<DivByZeroStrat, Orientation> {
        RxnevConfig::from(self)
    }
}
