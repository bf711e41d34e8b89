use crate::address::DecomposedAddress;
use crate::cache::CacheSets;
use crate::config::PolicyConfig;
use crate::replacement_policies::ReplacementPolicy;
use crate::trace::Operation;

/// Whether an access found its line resident
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Hit,
    Miss,
}

impl Outcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Outcome::Hit)
    }
}

/// When the line after the accessed one is brought into the cache
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Prefetch {
    Never,
    Always,
    OnMiss,
}

impl Prefetch {
    fn fires(&self, outcome: Outcome) -> bool {
        match self {
            Prefetch::Never => false,
            Prefetch::Always => true,
            Prefetch::OnMiss => outcome == Outcome::Miss,
        }
    }
}

/// The allocation and prefetch decisions of a policy, resolved once when a cache is built
///
/// Which lines get evicted is left to the set's `ReplacementPolicy`, the engine only decides
/// whether a miss allocates and whether a prefetch follows
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PolicyEngine {
    write_allocate: bool,
    prefetch: Prefetch,
}

impl PolicyEngine {
    pub fn new(write_allocate: bool, prefetch: Prefetch) -> Self {
        Self { write_allocate, prefetch }
    }

    /// True when `decide` wants the next line's decomposition
    pub fn needs_next_line(&self) -> bool {
        self.prefetch != Prefetch::Never
    }

    fn allocates(&self, operation: Operation) -> bool {
        self.write_allocate || operation == Operation::Load
    }

    /// Handles one access against the sets, returning whether it hit
    ///
    /// A miss allocates unless it is a store and write allocation is off, in which case the set is
    /// left exactly as it was. A prefetch looks the next line up in the set it maps to on its own and
    /// inserts it when absent. Prefetches are never reported, so they never count as accesses or hits
    ///
    /// # Arguments
    ///
    /// * `operation`: Load or store
    /// * `primary`: The accessed address
    /// * `next`: The line after it, `None` when no prefetch is wanted or it would wrap the address space
    /// * `sets`: The cache contents
    ///
    /// returns: Outcome
    pub fn decide<R: ReplacementPolicy>(
        &self,
        operation: Operation,
        primary: DecomposedAddress,
        next: Option<DecomposedAddress>,
        sets: &mut CacheSets<R>,
    ) -> Outcome {
        let outcome = if sets.lookup(primary.index, primary.tag) {
            Outcome::Hit
        } else {
            if self.allocates(operation) {
                let _ = sets.insert(primary.index, primary.tag);
            }
            Outcome::Miss
        };
        if self.prefetch.fires(outcome) {
            if let Some(next) = next {
                if !sets.lookup(next.index, next.tag) {
                    let _ = sets.insert(next.index, next.tag);
                }
            }
        }
        outcome
    }
}

impl From<PolicyConfig> for PolicyEngine {
    fn from(policy: PolicyConfig) -> Self {
        match policy {
            PolicyConfig::LeastRecentlyUsed | PolicyConfig::PseudoLeastRecentlyUsed => PolicyEngine::new(true, Prefetch::Never),
            PolicyConfig::NoAllocationOnWriteMiss => PolicyEngine::new(false, Prefetch::Never),
            PolicyConfig::PrefetchNextLine => PolicyEngine::new(true, Prefetch::Always),
            PolicyConfig::PrefetchNextLineOnMiss => PolicyEngine::new(true, Prefetch::OnMiss),
        }
    }
}
