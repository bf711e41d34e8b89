use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::cache::{CacheTrait, GenericCache};
use crate::config::{CacheConfig, PolicyConfig};
use crate::error::CacheError;
use crate::trace::{AccessRecord, TraceRecords};

/// Hit and access counts of one run. Displays as `hits,accesses`
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub hits: u64,
    pub accesses: u64,
}

impl Metrics {
    pub fn misses(&self) -> u64 {
        self.accesses - self.hits
    }

    /// Fraction of accesses that hit, 0 for an empty trace
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }
}

impl Display for Metrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.hits, self.accesses)
    }
}

/// The simulator replays traces against one cache and counts hits and accesses.
///
/// Counters start from zero on every run, the cache contents do not: replaying a second trace sees
/// whatever the first one left behind unless `reset` is called in between
pub struct Simulator {
    config: CacheConfig,
    policy: PolicyConfig,
    cache: GenericCache,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator with a cold cache
    ///
    /// # Arguments
    ///
    /// * `config`: The cache geometry
    /// * `policy`: The policy the cache runs with
    ///
    /// returns: Result<Simulator, CacheError>
    pub fn new(config: &CacheConfig, policy: PolicyConfig) -> Result<Self, CacheError> {
        Ok(Self {
            config: *config,
            policy,
            cache: GenericCache::new(config, policy)?,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Replays a trace in order, returning the counts for this run alone
    pub fn run<T>(&mut self, trace: T) -> Metrics
    where
        T: IntoIterator<Item = AccessRecord>,
    {
        let start = Instant::now();
        let mut metrics = Metrics::default();
        for record in trace {
            metrics.accesses += 1;
            if self.cache.access(record).is_hit() {
                metrics.hits += 1;
            }
        }
        self.finish(start, metrics)
    }

    /// Replays a trace whose records may fail to parse
    ///
    /// The first error ends the run and is returned instead of any counts. The cache keeps whatever
    /// state the records before it produced
    pub fn try_run<T, E>(&mut self, trace: T) -> Result<Metrics, E>
    where
        T: IntoIterator<Item = Result<AccessRecord, E>>,
    {
        let start = Instant::now();
        let mut metrics = Metrics::default();
        for record in trace {
            metrics.accesses += 1;
            if self.cache.access(record?).is_hit() {
                metrics.hits += 1;
            }
        }
        Ok(self.finish(start, metrics))
    }

    /// Parses and replays a textual trace held in memory
    ///
    /// # Arguments
    ///
    /// * `bytes`: `<flag> <hex address>` pairs separated by whitespace
    ///
    /// returns: Result<Metrics, CacheError>
    pub fn simulate(&mut self, bytes: &[u8]) -> Result<Metrics, CacheError> {
        self.try_run(TraceRecords::new(bytes))
    }

    /// Throws away the cache contents, leaving a cold cache with the same configuration
    pub fn reset(&mut self) -> Result<(), CacheError> {
        self.cache = GenericCache::new(&self.config, self.policy)?;
        Ok(())
    }

    /// Gets the wall-clock time spent replaying, summed over every run
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of ways no run has filled yet
    pub fn get_empty_way_count(&self) -> usize {
        self.cache.get_empty_way_count()
    }

    fn finish(&mut self, start: Instant, metrics: Metrics) -> Metrics {
        let elapsed = start.elapsed();
        self.simulation_time += elapsed;
        debug!(
            policy = %self.policy,
            hits = metrics.hits,
            accesses = metrics.accesses,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "run complete"
        );
        metrics
    }
}

/// Replays a trace against a fresh, cold cache
pub fn run<T>(trace: T, config: &CacheConfig, policy: PolicyConfig) -> Result<Metrics, CacheError>
where
    T: IntoIterator<Item = AccessRecord>,
{
    Ok(Simulator::new(config, policy)?.run(trace))
}
