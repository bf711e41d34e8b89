use super::{render, synthetic_records};
use crate::config::{Associativity, PolicyConfig, RunConfig};
use crate::simulator::Metrics;
use crate::sweep::{Sweep, SweepReport};

fn metrics(report: &SweepReport) -> Vec<Option<Metrics>> {
    report.groups.iter().flat_map(|group| group.runs.iter().map(|run| run.metrics)).collect()
}

#[test]
fn default_sweep_covers_every_policy() {
    let sweep = Sweep::default();
    assert_eq!(sweep.groups.len(), 7);
    assert_eq!(sweep.run_count(), 22);
    for policy in PolicyConfig::ALL {
        assert!(sweep.groups.iter().flat_map(|group| &group.runs).any(|run| run.policy == policy));
    }
    for run in sweep.groups.iter().flat_map(|group| &group.runs) {
        assert!(run.cache_config().is_ok(), "{run} should be valid");
    }
}

#[test]
fn parallel_evaluation_keeps_sweep_order() {
    let trace = render(&synthetic_records(10_000, 17));
    let sweep = Sweep::default();
    let sequential = sweep.evaluate(trace.as_bytes(), 1);
    let parallel = sweep.evaluate(trace.as_bytes(), 4);
    assert_eq!(metrics(&sequential), metrics(&parallel));
    assert!(metrics(&parallel).iter().all(|run| run.map(|m| m.accesses) == Some(10_000)));
    let titles: Vec<&str> = parallel.groups.iter().map(|group| group.title.as_str()).collect();
    let expected: Vec<&str> = sweep.groups.iter().map(|group| group.title.as_str()).collect();
    assert_eq!(titles, expected);
}

#[test]
fn failed_run_does_not_stop_the_others() {
    let sweep = Sweep::single(
        "mixed",
        vec![
            RunConfig::new(1024, 32, Associativity::Direct, PolicyConfig::LeastRecentlyUsed),
            RunConfig::new(1000, 32, Associativity::Direct, PolicyConfig::LeastRecentlyUsed),
            RunConfig::new(96, 32, Associativity::Full, PolicyConfig::PseudoLeastRecentlyUsed),
            RunConfig::new(96, 32, Associativity::Full, PolicyConfig::LeastRecentlyUsed),
        ],
    );
    for jobs in [1, 3] {
        let report = sweep.evaluate(b"L 10 L 10", jobs);
        let runs = &report.groups[0].runs;
        assert_eq!(runs[0].metrics, Some(Metrics { hits: 1, accesses: 2 }));
        assert!(runs[1].metrics.is_none() && runs[1].error.is_some());
        assert!(runs[2].metrics.is_none() && runs[2].error.is_some());
        assert_eq!(runs[3].metrics, Some(Metrics { hits: 1, accesses: 2 }));
    }
}

#[test]
fn malformed_trace_fails_every_run_without_counts() {
    let report = Sweep::default().evaluate(b"L 10 L", 2);
    assert!(report.groups.iter().flat_map(|group| &group.runs).all(|run| run.metrics.is_none() && run.error.is_some()));
}

#[test]
fn sweep_reads_from_json() {
    let sweep: Sweep = serde_json::from_str(
        r#"{"groups": [{"title": "small", "runs": [
            {"cache_size": 1024, "line_size": 32, "ways": "direct", "policy": "LRU"},
            {"cache_size": 16384, "line_size": 32, "ways": 16, "policy": "prefetchNextLineOnMiss"}
        ]}]}"#,
    )
    .unwrap();
    assert_eq!(sweep.run_count(), 2);
    assert_eq!(sweep.groups[0].runs[1].policy, PolicyConfig::PrefetchNextLineOnMiss);
}
