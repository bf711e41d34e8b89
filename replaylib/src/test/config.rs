use crate::config::{Associativity, CacheConfig, PolicyConfig, RunConfig};
use crate::error::CacheError;

fn is_invalid<T: std::fmt::Debug>(result: Result<T, CacheError>) -> bool {
    matches!(result, Err(CacheError::InvalidConfiguration(_)))
}

#[test]
fn sets_are_derived_from_size_line_and_ways() {
    let direct = CacheConfig::new(1024, 32, 1).unwrap();
    assert_eq!(direct.num_sets(), 32);
    let full = CacheConfig::new(16384, 32, 512).unwrap();
    assert_eq!(full.num_sets(), 1);
    assert_eq!(full.num_sets() * full.line_size() * full.ways(), full.cache_size());
}

#[test]
fn invalid_geometry_is_rejected() {
    assert!(is_invalid(CacheConfig::new(16384, 32, 0)));
    assert!(is_invalid(CacheConfig::new(1000, 32, 1)));
    assert!(is_invalid(CacheConfig::new(1024, 24, 1)));
    assert!(is_invalid(CacheConfig::new(1024, 0, 1)));
    assert!(is_invalid(CacheConfig::new(3072, 32, 1)));
    assert!(is_invalid(CacheConfig::new(0, 32, 1)));
    assert!(is_invalid(CacheConfig::new(u64::MAX, 1 << 62, 8)));
}

#[test]
fn cache_config_is_validated_when_deserialised() {
    let config: CacheConfig = serde_json::from_str(r#"{"cache_size": 4096, "line_size": 64, "ways": 4}"#).unwrap();
    assert_eq!(config.num_sets(), 16);
    assert!(serde_json::from_str::<CacheConfig>(r#"{"cache_size": 4096, "line_size": 48, "ways": 4}"#).is_err());
}

#[test]
fn policy_names_parse_case_insensitively() {
    for policy in PolicyConfig::ALL {
        assert_eq!(policy.name().parse::<PolicyConfig>().unwrap(), policy);
        assert_eq!(policy.name().to_uppercase().parse::<PolicyConfig>().unwrap(), policy);
    }
    assert_eq!("noAllocationOnWriteMiss".parse::<PolicyConfig>().unwrap(), PolicyConfig::NoAllocationOnWriteMiss);
    assert_eq!("pnl".parse::<PolicyConfig>().unwrap(), PolicyConfig::PrefetchNextLine);
}

#[test]
fn unknown_policy_is_its_own_error() {
    assert!(matches!("FIFO".parse::<PolicyConfig>(), Err(CacheError::UnknownPolicy(name)) if name == "FIFO"));
    assert!(serde_json::from_str::<PolicyConfig>(r#""random""#).is_err());
}

#[test]
fn associativity_accepts_names_and_counts() {
    assert_eq!("direct".parse::<Associativity>().unwrap(), Associativity::Direct);
    assert_eq!("FULL".parse::<Associativity>().unwrap(), Associativity::Full);
    assert_eq!("8way".parse::<Associativity>().unwrap(), Associativity::Ways(8));
    assert_eq!("4-way".parse::<Associativity>().unwrap(), Associativity::Ways(4));
    assert_eq!("16".parse::<Associativity>().unwrap(), Associativity::Ways(16));
    assert!(is_invalid("wide".parse::<Associativity>()));
    assert_eq!(Associativity::Full.ways(16384, 32).unwrap(), 512);
    assert!(is_invalid(Associativity::Full.ways(16384, 0)));
}

#[test]
fn run_spec_resolves_to_a_cache_config() {
    let run: RunConfig = "16384:32:full:PLRU".parse().unwrap();
    assert_eq!(run.policy, PolicyConfig::PseudoLeastRecentlyUsed);
    assert_eq!(run.cache_config().unwrap().ways(), 512);
    let run: RunConfig = " 1KB : 32B : direct : lru ".parse().unwrap();
    assert_eq!(run.cache_config().unwrap(), CacheConfig::new(1024, 32, 1).unwrap());
    assert_eq!(run.to_string(), "1024:32:direct:LRU");
}

#[test]
fn broken_run_specs_are_reported() {
    assert!(is_invalid("16384:32:2way".parse::<RunConfig>()));
    assert!(is_invalid("16384:32:twoway:LRU".parse::<RunConfig>()));
    assert!(matches!("16384:32:2way:MRU".parse::<RunConfig>(), Err(CacheError::UnknownPolicy(_))));
    assert!(is_invalid("99999999999999999999:32:2way:LRU".parse::<RunConfig>()));
    // Parses fine, the geometry is what fails
    let run: RunConfig = "1000:32:2way:LRU".parse().unwrap();
    assert!(is_invalid(run.cache_config()));
}

#[test]
fn run_config_reads_from_json() {
    let run: RunConfig =
        serde_json::from_str(r#"{"cache_size": 16384, "line_size": 32, "ways": "4way", "policy": "PrefetchNextLine"}"#).unwrap();
    assert_eq!(run, RunConfig::new(16384, 32, Associativity::Ways(4), PolicyConfig::PrefetchNextLine));
    let run: RunConfig = serde_json::from_str(r#"{"cache_size": 1024, "line_size": 32, "associativity": 1}"#).unwrap();
    assert_eq!(run.policy, PolicyConfig::LeastRecentlyUsed);
    assert_eq!(run.associativity, Associativity::Ways(1));
}
