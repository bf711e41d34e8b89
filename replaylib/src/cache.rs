use tracing::debug;
use crate::address::{AddressDecomposer, DecomposedAddress};
use crate::config::{CacheConfig, PolicyConfig};
use crate::error::CacheError;
use crate::policy::{Outcome, PolicyEngine};
use crate::replacement_policies::{LeastRecentlyUsed, PseudoLeastRecentlyUsed, ReplacementPolicy};
use crate::trace::AccessRecord;

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch through `GenericCache` rather than
/// `dyn CacheTrait`, but it keeps the surface the simulator relies on in one place
pub trait CacheTrait {
    /// Converts an address into its tag, set index and offset
    fn decompose(&self, address: u64) -> DecomposedAddress;

    /// Replays one access, updating replacement state, allocation and prefetches as the policy
    /// dictates
    ///
    /// returns: Outcome
    fn access(&mut self, record: AccessRecord) -> Outcome;

    /// Gets the line size used by this cache
    fn get_line_size(&self) -> u64;

    /// Gets the number of empty ways across every set
    fn get_empty_way_count(&self) -> usize;
}

/// The sets of a cache, one replacement state per index value
///
/// Sized once when built, never resized
#[derive(Debug, Clone)]
pub struct CacheSets<R: ReplacementPolicy> {
    sets: Vec<R>,
}

impl<R: ReplacementPolicy> CacheSets<R> {
    pub fn new(num_sets: usize, ways: usize) -> Self {
        Self {
            sets: (0..num_sets).map(|_| R::with_ways(ways)).collect(),
        }
    }

    #[inline]
    pub fn lookup(&mut self, index: usize, tag: u64) -> bool {
        self.sets[index].lookup(tag)
    }

    /// Inserts a missing tag, returning whatever it evicted
    #[inline]
    pub fn insert(&mut self, index: usize, tag: u64) -> Option<u64> {
        self.sets[index].insert_on_miss(tag)
    }

    pub fn contains(&self, index: usize, tag: u64) -> bool {
        self.sets[index].contains(tag)
    }

    pub fn set(&self, index: usize) -> &R {
        &self.sets[index]
    }

    pub fn empty_ways(&self) -> usize {
        self.sets.iter().map(|set| set.empty_ways()).sum()
    }
}

/// A cache parameterised by the per-set replacement state
///
/// The replacement state is monomorphised in, so the per-access path is free of dynamic dispatch
#[derive(Debug, Clone)]
pub struct Cache<R: ReplacementPolicy> {
    decomposer: AddressDecomposer,
    line_size: u64,
    sets: CacheSets<R>,
    engine: PolicyEngine,
}

impl<R: ReplacementPolicy> Cache<R> {
    pub fn new(config: &CacheConfig, engine: PolicyEngine) -> Result<Self, CacheError> {
        Ok(Self {
            decomposer: AddressDecomposer::for_config(config)?,
            line_size: config.line_size(),
            sets: CacheSets::new(config.num_sets() as usize, config.ways() as usize),
            engine,
        })
    }

    pub fn sets(&self) -> &CacheSets<R> {
        &self.sets
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    #[inline]
    fn decompose(&self, address: u64) -> DecomposedAddress {
        self.decomposer.decompose(address)
    }

    fn access(&mut self, record: AccessRecord) -> Outcome {
        let primary = self.decomposer.decompose(record.address);
        let next = if self.engine.needs_next_line() {
            record.address.checked_add(self.line_size).map(|next| self.decomposer.decompose(next))
        } else {
            None
        };
        self.engine.decide(record.operation, primary, next, &mut self.sets)
    }

    fn get_line_size(&self) -> u64 {
        self.line_size
    }

    fn get_empty_way_count(&self) -> usize {
        self.sets.empty_ways()
    }
}

/// Enum over both families of per-set state
///
/// Using trait objects would mean an opaque call for every access in the trace, explicitly
/// branching lets the compiler see the concrete types and inline through them
#[derive(Debug, Clone)]
pub enum GenericCache {
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    PseudoLeastRecentlyUsed(Cache<PseudoLeastRecentlyUsed>),
}

impl GenericCache {
    /// Builds a cold cache for a configuration and policy
    pub fn new(config: &CacheConfig, policy: PolicyConfig) -> Result<Self, CacheError> {
        let engine = PolicyEngine::from(policy);
        let cache = match policy {
            PolicyConfig::PseudoLeastRecentlyUsed => {
                if !config.ways().is_power_of_two() {
                    return Err(CacheError::invalid(format!(
                        "PLRU needs a power of two number of ways, got {}",
                        config.ways()
                    )));
                }
                GenericCache::from(Cache::<PseudoLeastRecentlyUsed>::new(config, engine)?)
            }
            PolicyConfig::LeastRecentlyUsed
            | PolicyConfig::NoAllocationOnWriteMiss
            | PolicyConfig::PrefetchNextLine
            | PolicyConfig::PrefetchNextLineOnMiss => GenericCache::from(Cache::<LeastRecentlyUsed>::new(config, engine)?),
        };
        debug!(
            cache_size = config.cache_size(),
            line_size = config.line_size(),
            ways = config.ways(),
            sets = config.num_sets(),
            %policy,
            "built cache"
        );
        Ok(cache)
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<PseudoLeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<PseudoLeastRecentlyUsed>) -> Self {
        Self::PseudoLeastRecentlyUsed(value)
    }
}

impl CacheTrait for GenericCache {
    fn decompose(&self, address: u64) -> DecomposedAddress {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.decompose(address),
            GenericCache::PseudoLeastRecentlyUsed(c) => c.decompose(address),
        }
    }

    fn access(&mut self, record: AccessRecord) -> Outcome {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.access(record),
            GenericCache::PseudoLeastRecentlyUsed(c) => c.access(record),
        }
    }

    fn get_line_size(&self) -> u64 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.get_line_size(),
            GenericCache::PseudoLeastRecentlyUsed(c) => c.get_line_size(),
        }
    }

    fn get_empty_way_count(&self) -> usize {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.get_empty_way_count(),
            GenericCache::PseudoLeastRecentlyUsed(c) => c.get_empty_way_count(),
        }
    }
}
