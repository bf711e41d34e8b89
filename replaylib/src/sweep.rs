use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::config::{Associativity, PolicyConfig, RunConfig};
use crate::error::CacheError;
use crate::simulator::{Metrics, Simulator};

/// A table of configurations to replay one trace against, grouped for reporting
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub groups: Vec<SweepGroup>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SweepGroup {
    pub title: String,
    pub runs: Vec<RunConfig>,
}

/// The results of a sweep, in the same order as the sweep itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub title: String,
    pub runs: Vec<RunReport>,
}

/// The outcome of one configuration. Exactly one of `metrics` and `error` is set, a failed run
/// reports no counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run: RunConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    fn new(run: RunConfig, result: Result<Metrics, CacheError>) -> Self {
        match result {
            Ok(metrics) => Self { run, metrics: Some(metrics), error: None },
            Err(e) => {
                warn!(%run, error = %e, "run failed");
                Self { run, metrics: None, error: Some(e.to_string()) }
            }
        }
    }
}

impl Sweep {
    /// A sweep holding a single group, for ad hoc runs
    pub fn single(title: impl Into<String>, runs: Vec<RunConfig>) -> Self {
        Self {
            groups: vec![SweepGroup { title: title.into(), runs }],
        }
    }

    /// Reads a sweep from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn run_count(&self) -> usize {
        self.groups.iter().map(|group| group.runs.len()).sum()
    }

    /// Replays `trace` against every configuration, each starting from a cold cache
    ///
    /// With `jobs` above 1 configurations are spread over that many threads. Accesses within one
    /// configuration are always replayed in order on a single thread
    ///
    /// # Arguments
    ///
    /// * `trace`: The textual trace, re-read from the start for every configuration
    /// * `jobs`: The number of threads to use
    ///
    /// returns: SweepReport
    pub fn evaluate(&self, trace: &[u8], jobs: usize) -> SweepReport {
        let runs: Vec<RunConfig> = self.groups.iter().flat_map(|group| group.runs.iter().copied()).collect();
        let jobs = jobs.clamp(1, runs.len().max(1));
        debug!(runs = runs.len(), jobs, "evaluating sweep");
        let mut results: Vec<Option<RunReport>> = if jobs == 1 {
            runs.iter().map(|run| Some(RunReport::new(*run, evaluate_run(run, trace)))).collect()
        } else {
            evaluate_parallel(&runs, trace, jobs)
        };
        let mut slots = results.iter_mut();
        let groups = self
            .groups
            .iter()
            .map(|group| GroupReport {
                title: group.title.clone(),
                runs: group
                    .runs
                    .iter()
                    .zip(slots.by_ref())
                    .map(|(run, slot)| {
                        slot.take().unwrap_or_else(|| {
                            RunReport::new(*run, Err(CacheError::invalid("the run was never evaluated")))
                        })
                    })
                    .collect(),
            })
            .collect();
        SweepReport { groups }
    }
}

fn evaluate_run(run: &RunConfig, trace: &[u8]) -> Result<Metrics, CacheError> {
    let config = run.cache_config()?;
    Simulator::new(&config, run.policy)?.simulate(trace)
}

fn evaluate_parallel(runs: &[RunConfig], trace: &[u8], jobs: usize) -> Vec<Option<RunReport>> {
    let mut results: Vec<Option<RunReport>> = vec![None; runs.len()];
    let (sender, receiver) = mpsc::channel::<(usize, RunReport)>();
    thread::scope(|scope| {
        for worker in 0..jobs {
            let sender = sender.clone();
            scope.spawn(move || {
                for (slot, run) in runs.iter().enumerate().skip(worker).step_by(jobs) {
                    let report = RunReport::new(*run, evaluate_run(run, trace));
                    if sender.send((slot, report)).is_err() {
                        break;
                    }
                }
            });
        }
        // Only the workers' senders are left, so the receiver finishes once they all do
        drop(sender);
        for (slot, report) in receiver {
            results[slot] = Some(report);
        }
    });
    results
}

impl Default for Sweep {
    /// Direct mapped, set associative and fully associative caches with 32B lines, then every
    /// write and prefetch policy at 2 to 16 ways
    fn default() -> Self {
        const LINE: u64 = 32;
        const SIZE: u64 = 16 * 1024;
        let ways = |policy: PolicyConfig| -> Vec<RunConfig> {
            [2, 4, 8, 16]
                .into_iter()
                .map(|ways| RunConfig::new(SIZE, LINE, Associativity::Ways(ways), policy))
                .collect()
        };
        let group = |title: &str, runs: Vec<RunConfig>| SweepGroup { title: title.to_string(), runs };
        Sweep {
            groups: vec![
                group(
                    "Direct Mapped Cache (1KB, 4KB, 16KB, 32KB) w/ line size of 32B",
                    [1024, 4096, 16384, 32768]
                        .into_iter()
                        .map(|size| RunConfig::new(size, LINE, Associativity::Direct, PolicyConfig::LeastRecentlyUsed))
                        .collect(),
                ),
                group(
                    "2-, 4-, 8-, and 16- Way Set Associative Cache (16KB) w/ line size of 32B [LRU]",
                    ways(PolicyConfig::LeastRecentlyUsed),
                ),
                group(
                    "Fully Associative Cache (16KB) w/ line size of 32B [LRU]",
                    vec![RunConfig::new(SIZE, LINE, Associativity::Full, PolicyConfig::LeastRecentlyUsed)],
                ),
                group(
                    "Fully Associative Cache (16KB) w/ line size of 32B [PLRU]",
                    vec![RunConfig::new(SIZE, LINE, Associativity::Full, PolicyConfig::PseudoLeastRecentlyUsed)],
                ),
                group(
                    "2-, 4-, 8-, and 16- Way Set Associative Cache (16KB) w/ line size of 32B [NoAllocationOnWriteMiss]",
                    ways(PolicyConfig::NoAllocationOnWriteMiss),
                ),
                group(
                    "2-, 4-, 8-, and 16- Way Set Associative Cache (16KB) w/ line size of 32B [PrefetchNextLine]",
                    ways(PolicyConfig::PrefetchNextLine),
                ),
                group(
                    "2-, 4-, 8-, and 16- Way Set Associative Cache (16KB) w/ line size of 32B [PrefetchNextLineOnMiss]",
                    ways(PolicyConfig::PrefetchNextLineOnMiss),
                ),
            ],
        }
    }
}
