use std::collections::{HashMap, HashSet};

use centime_core::Fingerprint;

/// Digest lookup surface owned by the persistence collaborator.
///
/// Keyed by account slug: a digest seen on one account never marks a row on
/// another account as a duplicate. Callers must serialize lookup/insert per
/// account; the `&mut self` insert makes concurrent imports for one account
/// impossible to race through a single store value.
pub trait FingerprintStore {
    fn contains(&self, account_slug: &str, fingerprint: &Fingerprint) -> bool;
    fn insert(&mut self, account_slug: &str, fingerprint: Fingerprint);
}

/// In-memory store for tests and single-shot imports.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    seen: HashMap<String, HashSet<Fingerprint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total digests across all accounts.
    pub fn len(&self) -> usize {
        self.seen.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.values().all(HashSet::is_empty)
    }
}

impl FingerprintStore for MemoryStore {
    fn contains(&self, account_slug: &str, fingerprint: &Fingerprint) -> bool {
        self.seen
            .get(account_slug)
            .is_some_and(|digests| digests.contains(fingerprint))
    }

    fn insert(&mut self, account_slug: &str, fingerprint: Fingerprint) {
        self.seen
            .entry(account_slug.to_string())
            .or_default()
            .insert(fingerprint);
    }
}
