//! Interning of domains and indexers.
//!
//! A [`DomainRegistry`] maps structurally equal domains (and indexers) onto
//! one shared instance. It only holds weak references, so interned values
//! are freed once every caller drops them. The registry is an ordinary value:
//! callers create one and pass it to whatever builds domains, and clones
//! share the same tables.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::domain::{DiscreteDomain, DomainInner};
use crate::error::Result;
use crate::indexer::{IndexerInner, JointDomainIndexer};
use crate::value::DomainValue;

type Buckets<T> = HashMap<u64, Vec<Weak<T>>>;

/// Weak-value interning table for domains and indexers.
///
/// # Example
///
/// ```
/// use discrete_domain::{DiscreteDomain, DomainRegistry};
///
/// let registry = DomainRegistry::new();
/// let a = registry.domain(["x", "y"]).unwrap();
/// let b = registry.intern_domain(&DiscreteDomain::from_values(["x", "y"]).unwrap());
/// assert!(a.ptr_eq(&b));
/// ```
#[derive(Clone, Default)]
pub struct DomainRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    domains: Mutex<Buckets<DomainInner>>,
    indexers: Mutex<Buckets<IndexerInner>>,
}

/// Find a live entry equal to `candidate`, dropping dead entries on the way.
fn find_live<T, H>(bucket: &mut Vec<Weak<T>>, wrap: impl Fn(Arc<T>) -> H, candidate: &H) -> Option<H>
where
    H: PartialEq,
{
    bucket.retain(|w| w.strong_count() > 0);
    bucket
        .iter()
        .filter_map(Weak::upgrade)
        .map(wrap)
        .find(|existing| existing == candidate)
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical instance structurally equal to `domain`.
    pub fn intern_domain(&self, domain: &DiscreteDomain) -> DiscreteDomain {
        let mut domains = self.inner.domains.lock();
        let bucket = domains.entry(domain.hash_code()).or_default();
        if let Some(existing) = find_live(bucket, DiscreteDomain, domain) {
            return existing;
        }
        trace!(hash = domain.hash_code(), "interning new domain");
        bucket.push(Arc::downgrade(&domain.0));
        domain.clone()
    }

    /// Canonical instance structurally equal to `indexer`. The domains of a
    /// newly interned indexer are interned too.
    pub fn intern_indexer(&self, indexer: &JointDomainIndexer) -> JointDomainIndexer {
        let mut indexers = self.inner.indexers.lock();
        let bucket = indexers.entry(indexer.hash_code()).or_default();
        if let Some(existing) = find_live(bucket, JointDomainIndexer, indexer) {
            return existing;
        }

        let domains: Vec<DiscreteDomain> = indexer
            .domains()
            .iter()
            .map(|d| self.intern_domain(d))
            .collect();
        let shared = domains
            .iter()
            .zip(indexer.domains())
            .all(|(a, b)| a.ptr_eq(b));
        let canonical = if shared {
            indexer.clone()
        } else {
            indexer.with_domains(domains)
        };

        trace!(hash = indexer.hash_code(), dims = indexer.len(), "interning new indexer");
        bucket.push(Arc::downgrade(&canonical.0));
        canonical
    }

    /// Number of live interned domains.
    pub fn domain_count(&self) -> usize {
        count_live(&self.inner.domains.lock())
    }

    /// Number of live interned indexers.
    pub fn indexer_count(&self) -> usize {
        count_live(&self.inner.indexers.lock())
    }

    /// Drop table entries whose values have been freed.
    pub fn purge(&self) {
        purge_dead(&mut self.inner.domains.lock());
        purge_dead(&mut self.inner.indexers.lock());
    }

    // ========================================================================
    // Interning constructors
    // ========================================================================

    /// Interned [`DiscreteDomain::from_values`].
    pub fn domain<I, V>(&self, values: I) -> Result<DiscreteDomain>
    where
        I: IntoIterator<Item = V>,
        V: Into<DomainValue>,
    {
        Ok(self.intern_domain(&DiscreteDomain::from_values(values)?))
    }

    /// Interned [`DiscreteDomain::int_range`].
    pub fn int_range(&self, lower: i64, upper: i64, interval: i64) -> Result<DiscreteDomain> {
        Ok(self.intern_domain(&DiscreteDomain::int_range(lower, upper, interval)?))
    }

    /// Interned [`DiscreteDomain::real_range`].
    pub fn real_range(&self, lower: f64, upper: f64, interval: f64) -> Result<DiscreteDomain> {
        Ok(self.intern_domain(&DiscreteDomain::real_range(lower, upper, interval)?))
    }

    /// Interned [`DiscreteDomain::enumeration`].
    pub fn enumeration<S: AsRef<str>>(&self, names: &[S]) -> Result<DiscreteDomain> {
        Ok(self.intern_domain(&DiscreteDomain::enumeration(names)?))
    }

    /// Interned [`DiscreteDomain::joint`].
    pub fn joint_domain(&self, indexer: &JointDomainIndexer) -> Result<DiscreteDomain> {
        let indexer = self.intern_indexer(indexer);
        Ok(self.intern_domain(&DiscreteDomain::joint(&indexer)?))
    }

    /// Interned undirected indexer over `domains`.
    pub fn indexer(&self, domains: &[DiscreteDomain]) -> Result<JointDomainIndexer> {
        Ok(self.intern_indexer(&JointDomainIndexer::new(domains)?))
    }

    /// Interned directed indexer over `domains`.
    pub fn directed_indexer(
        &self,
        domains: &[DiscreteDomain],
        outputs: &[usize],
    ) -> Result<JointDomainIndexer> {
        Ok(self.intern_indexer(&JointDomainIndexer::directed(domains, outputs)?))
    }
}

fn count_live<T>(buckets: &Buckets<T>) -> usize {
    buckets
        .values()
        .flatten()
        .filter(|w| w.strong_count() > 0)
        .count()
}

fn purge_dead<T>(buckets: &mut Buckets<T>) {
    buckets.retain(|_, bucket| {
        bucket.retain(|w| w.strong_count() > 0);
        !bucket.is_empty()
    });
}
