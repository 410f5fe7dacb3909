/*!
Resolution of chemical mentions into canonical identifiers. The resolver is an external
collaborator, possibly slow or failing; [`CachedResolver`] memoizes any resolver.
*/
use crate::datastructure::ChemicalId;
use ahash::AHashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no identifier is known for `{0}`")]
    Unknown(String),
    #[error("identifier lookup of `{mention}` failed: {reason}")]
    Failed { mention: String, reason: String },
}

/// Maps a mention to a canonical identifier. A failure only excludes the mention from the
/// identifier matching; it never aborts the evaluation.
pub trait IdentifierResolver {
    fn resolve(&self, mention: &str) -> Result<ChemicalId, ResolutionError>;
}

impl<R: IdentifierResolver + ?Sized> IdentifierResolver for &R {
    fn resolve(&self, mention: &str) -> Result<ChemicalId, ResolutionError> {
        (**self).resolve(mention)
    }
}

impl<R: IdentifierResolver + ?Sized> IdentifierResolver for Box<R> {
    fn resolve(&self, mention: &str) -> Result<ChemicalId, ResolutionError> {
        (**self).resolve(mention)
    }
}

/// In-memory dictionary from chemical names to identifiers. Names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapResolver {
    names: AHashMap<String, ChemicalId>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }
    /// Registers `name`, replacing its previous identifier if any.
    pub fn insert(&mut self, name: &str, id: impl Into<ChemicalId>) -> Option<ChemicalId> {
        self.names.insert(name.trim().to_lowercase(), id.into())
    }
    pub fn len(&self) -> usize {
        self.names.len()
    }
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<N: AsRef<str>, I: Into<ChemicalId>> FromIterator<(N, I)> for MapResolver {
    fn from_iter<T: IntoIterator<Item = (N, I)>>(iter: T) -> Self {
        let mut resolver = Self::new();
        for (name, id) in iter {
            resolver.insert(name.as_ref(), id);
        }
        resolver
    }
}

impl IdentifierResolver for MapResolver {
    fn resolve(&self, mention: &str) -> Result<ChemicalId, ResolutionError> {
        self.names
            .get(&mention.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| ResolutionError::Unknown(mention.to_string()))
    }
}

/// Memoizes the answers (failures included) of another resolver. Safe to share between the
/// workers of a parallel evaluation.
#[derive(Debug, Default)]
pub struct CachedResolver<R> {
    inner: R,
    cache: RwLock<AHashMap<String, Result<ChemicalId, ResolutionError>>>,
}

impl<R: IdentifierResolver> CachedResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: RwLock::new(AHashMap::new()),
        }
    }
    /// Number of memoized mentions.
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: IdentifierResolver> IdentifierResolver for CachedResolver<R> {
    fn resolve(&self, mention: &str) -> Result<ChemicalId, ResolutionError> {
        let key = mention.trim().to_lowercase();
        if let Some(answer) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return answer.clone();
        }
        let answer = self.inner.resolve(mention);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(answer)
            .clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolver() -> MapResolver {
        [
            ("L-serine", "CHEBI:17115"),
            ("glycine", "CHEBI:15428"),
            ("Kaurenoic acid", "CHEBI:28487"),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    #[case("l-serine", Some("CHEBI:17115"))]
    #[case("GLYCINE", Some("CHEBI:15428"))]
    #[case(" kaurenoic acid ", Some("CHEBI:28487"))]
    #[case("serine", None)]
    fn test_map_resolver(#[case] mention: &str, #[case] expected: Option<&str>) {
        let resolved = resolver().resolve(mention);
        match expected {
            Some(id) => assert_eq!(resolved, Ok(ChemicalId::from(id))),
            None => assert_eq!(resolved, Err(ResolutionError::Unknown(mention.to_string()))),
        }
    }

    struct CountingResolver {
        calls: AtomicUsize,
    }

    impl IdentifierResolver for CountingResolver {
        fn resolve(&self, mention: &str) -> Result<ChemicalId, ResolutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if mention.eq_ignore_ascii_case("water") {
                Ok(ChemicalId::from("CHEBI:15377"))
            } else {
                Err(ResolutionError::Failed {
                    mention: mention.to_string(),
                    reason: String::from("service unavailable"),
                })
            }
        }
    }

    #[test]
    fn test_cached_resolver_memoizes_answers_and_failures() {
        let cached = CachedResolver::new(CountingResolver {
            calls: AtomicUsize::new(0),
        });
        for _ in 0..3 {
            assert!(cached.resolve("Water").is_ok());
            assert!(cached.resolve("water").is_ok());
            assert!(cached.resolve("ethanol").is_err());
        }
        assert_eq!(cached.cached(), 2);
        assert_eq!(cached.into_inner().calls.load(Ordering::SeqCst), 2);
    }
}
