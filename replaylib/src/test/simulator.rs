use super::{render, synthetic_records};
use crate::config::{CacheConfig, PolicyConfig};
use crate::error::CacheError;
use crate::simulator::{run, Metrics, Simulator};
use crate::trace::AccessRecord;

#[test]
fn direct_mapped_repeat_access_hits_once() {
    let config = CacheConfig::new(1024, 32, 1).unwrap();
    let trace = [AccessRecord::load(0x7fff_1234), AccessRecord::load(0x7fff_1234)];
    let metrics = run(trace, &config, PolicyConfig::LeastRecentlyUsed).unwrap();
    assert_eq!(metrics, Metrics { hits: 1, accesses: 2 });
}

#[test]
fn two_way_thrashing_never_hits() {
    let config = CacheConfig::new(16384, 32, 2).unwrap();
    let trace = [0, 0x2000, 0x4000, 0].map(AccessRecord::load);
    let metrics = run(trace, &config, PolicyConfig::LeastRecentlyUsed).unwrap();
    assert_eq!(metrics, Metrics { hits: 0, accesses: 4 });
}

#[test]
fn empty_trace_counts_nothing() {
    let config = CacheConfig::new(16384, 32, 4).unwrap();
    for policy in PolicyConfig::ALL {
        let mut simulator = Simulator::new(&config, policy).unwrap();
        assert_eq!(simulator.run(Vec::new()), Metrics::default());
        assert_eq!(simulator.simulate(b"").unwrap(), Metrics::default());
        assert_eq!(simulator.simulate(b" \n\t\n").unwrap(), Metrics::default());
    }
}

#[test]
fn every_record_is_one_access() {
    let records = synthetic_records(20_000, 3);
    for (size, ways) in [(1024, 1), (16384, 2), (16384, 16), (16384, 512)] {
        let config = CacheConfig::new(size, 32, ways).unwrap();
        for policy in PolicyConfig::ALL {
            let metrics = run(records.iter().copied(), &config, policy).unwrap();
            assert_eq!(metrics.accesses, records.len() as u64);
            assert!(metrics.hits <= metrics.accesses);
            assert_eq!(metrics.misses(), metrics.accesses - metrics.hits);
        }
    }
}

#[test]
fn plru_matches_lru_for_direct_and_two_way() {
    let records = synthetic_records(20_000, 11);
    for ways in [1, 2] {
        let config = CacheConfig::new(4096, 32, ways).unwrap();
        let exact = run(records.iter().copied(), &config, PolicyConfig::LeastRecentlyUsed).unwrap();
        let pseudo = run(records.iter().copied(), &config, PolicyConfig::PseudoLeastRecentlyUsed).unwrap();
        assert_eq!(exact, pseudo, "{ways} ways");
    }
}

#[test]
fn prefetch_misses_its_lines_without_counting_them() {
    // 32 sets of 16 ways. Lines 4KB apart all land in set 0 and their next lines in set 1, so the
    // prefetched lines are never accessed and never displace anything that is
    let config = CacheConfig::new(16384, 32, 16).unwrap();
    let trace: Vec<AccessRecord> = (0..3).flat_map(|_| (0..8).map(|line| AccessRecord::load(line * 4096))).collect();
    let exact = run(trace.iter().copied(), &config, PolicyConfig::LeastRecentlyUsed).unwrap();
    assert_eq!(exact, Metrics { hits: 16, accesses: 24 });
    for policy in [PolicyConfig::PrefetchNextLine, PolicyConfig::PrefetchNextLineOnMiss] {
        assert_eq!(run(trace.iter().copied(), &config, policy).unwrap(), exact);
    }
}

#[test]
fn no_allocation_never_beats_lru_on_a_store_only_stream() {
    let config = CacheConfig::new(1024, 32, 2).unwrap();
    let trace = [0x100, 0x100, 0x100].map(AccessRecord::store);
    let lru = run(trace, &config, PolicyConfig::LeastRecentlyUsed).unwrap();
    let write_around = run(trace, &config, PolicyConfig::NoAllocationOnWriteMiss).unwrap();
    assert_eq!(lru, Metrics { hits: 2, accesses: 3 });
    assert_eq!(write_around, Metrics { hits: 0, accesses: 3 });
}

#[test]
fn counters_restart_but_contents_persist_until_reset() {
    let config = CacheConfig::new(1024, 32, 4).unwrap();
    let trace = [0x40, 0x80, 0xc0].map(AccessRecord::load);
    let mut simulator = Simulator::new(&config, PolicyConfig::LeastRecentlyUsed).unwrap();
    assert_eq!(simulator.run(trace), Metrics { hits: 0, accesses: 3 });
    assert_eq!(simulator.run(trace), Metrics { hits: 3, accesses: 3 });
    assert_eq!(simulator.get_empty_way_count(), 32 - 3);
    simulator.reset().unwrap();
    assert_eq!(simulator.get_empty_way_count(), 32);
    assert_eq!(simulator.run(trace), Metrics { hits: 0, accesses: 3 });
}

#[test]
fn textual_trace_replays_like_parsed_records() {
    let records = synthetic_records(5_000, 5);
    let text = render(&records);
    let config = CacheConfig::new(16384, 32, 8).unwrap();
    for policy in PolicyConfig::ALL {
        let mut simulator = Simulator::new(&config, policy).unwrap();
        let from_text = simulator.simulate(text.as_bytes()).unwrap();
        assert_eq!(from_text, run(records.iter().copied(), &config, policy).unwrap());
    }
}

#[test]
fn malformed_record_fails_the_whole_run() {
    let config = CacheConfig::new(1024, 32, 1).unwrap();
    let mut simulator = Simulator::new(&config, PolicyConfig::LeastRecentlyUsed).unwrap();
    match simulator.simulate(b"L 10\nL 10\nS zz\nL 10\n") {
        Err(CacheError::MalformedTraceRecord { record, token, .. }) => {
            assert_eq!(record, 3);
            assert_eq!(token, "zz");
        }
        other => panic!("expected a malformed record, got {other:?}"),
    }
}

#[test]
fn metrics_display_as_hits_then_accesses() {
    let metrics = Metrics { hits: 3, accesses: 4 };
    assert_eq!(metrics.to_string(), "3,4");
    assert_eq!(metrics.hit_rate(), 0.75);
    assert_eq!(Metrics::default().hit_rate(), 0.0);
}
