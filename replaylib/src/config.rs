use std::fmt::{Display, Formatter};
use std::str::FromStr;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::CacheError;

lazy_static! {
    static ref ASSOCIATIVITY_PATTERN: Regex =
        Regex::new(r"^(?i)(?:(?P<direct>direct)|(?P<full>full|fully)|(?P<ways>[0-9]+)(?:-?ways?)?)$").unwrap();
    static ref RUN_PATTERN: Regex =
        Regex::new(r"^\s*(?P<size>[0-9]+)(?P<size_unit>[kKmM]?)[bB]?\s*:\s*(?P<line>[0-9]+)[bB]?\s*:\s*(?P<assoc>[^:\s]+)\s*:\s*(?P<policy>[A-Za-z]+)\s*$").unwrap();
}

/// The geometry of a single cache: its capacity, its line size and its associativity
///
/// Only constructed through validation, so a `CacheConfig` in hand always satisfies
/// `num_sets * line_size * ways == cache_size` with a power of two line size and set count
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCacheConfig", into = "RawCacheConfig")]
pub struct CacheConfig {
    cache_size: u64,
    line_size: u64,
    ways: u64,
    num_sets: u64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
struct RawCacheConfig {
    cache_size: u64,
    line_size: u64,
    ways: u64,
}

impl CacheConfig {
    /// Validates and builds a cache geometry
    ///
    /// # Arguments
    ///
    /// * `cache_size`: Total capacity in bytes
    /// * `line_size`: Bytes per line, a power of two
    /// * `ways`: Lines per set. 1 is direct mapped, `cache_size / line_size` is fully associative
    ///
    /// returns: Result<CacheConfig, CacheError>
    ///
    /// # Examples
    ///
    /// ```
    /// use replaylib::config::CacheConfig;
    /// let config = CacheConfig::new(16384, 32, 2).unwrap();
    /// assert_eq!(config.num_sets(), 256);
    /// assert!(CacheConfig::new(16384, 32, 0).is_err());
    /// ```
    pub fn new(cache_size: u64, line_size: u64, ways: u64) -> Result<Self, CacheError> {
        if ways < 1 {
            return Err(CacheError::invalid("the number of ways cannot be less than 1"));
        }
        if !line_size.is_power_of_two() {
            return Err(CacheError::invalid(format!("line size {line_size} is not a power of two")));
        }
        let set_bytes = line_size
            .checked_mul(ways)
            .ok_or_else(|| CacheError::invalid(format!("{ways} ways of {line_size}B lines overflows")))?;
        if cache_size % set_bytes != 0 {
            return Err(CacheError::invalid(format!(
                "cache size {cache_size} is not divisible by line size * ways ({set_bytes})"
            )));
        }
        let num_sets = cache_size / set_bytes;
        if !num_sets.is_power_of_two() {
            return Err(CacheError::invalid(format!(
                "{num_sets} sets derived from cache size {cache_size}, line size {line_size}, {ways} ways is not a power of two"
            )));
        }
        Ok(Self { cache_size, line_size, ways, num_sets })
    }

    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    pub fn line_size(&self) -> u64 {
        self.line_size
    }

    pub fn ways(&self) -> u64 {
        self.ways
    }

    pub fn num_sets(&self) -> u64 {
        self.num_sets
    }
}

impl TryFrom<RawCacheConfig> for CacheConfig {
    type Error = CacheError;

    fn try_from(raw: RawCacheConfig) -> Result<Self, Self::Error> {
        CacheConfig::new(raw.cache_size, raw.line_size, raw.ways)
    }
}

impl From<CacheConfig> for RawCacheConfig {
    fn from(config: CacheConfig) -> Self {
        RawCacheConfig {
            cache_size: config.cache_size,
            line_size: config.line_size,
            ways: config.ways,
        }
    }
}

/// The policy a cache runs with. Selected once when the cache is built
///
/// Names are matched case-insensitively, both from the command line and from JSON
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PolicyConfig {
    /// Exact least recently used, loads and stores alike
    LeastRecentlyUsed,
    /// Tree based pseudo LRU using one hot/cold bit per internal node
    PseudoLeastRecentlyUsed,
    /// LRU, but a store that misses is written around the cache
    NoAllocationOnWriteMiss,
    /// LRU, and the next line is brought in on every access
    PrefetchNextLine,
    /// LRU, and the next line is brought in whenever the access misses
    PrefetchNextLineOnMiss,
}

impl PolicyConfig {
    pub const ALL: [PolicyConfig; 5] = [
        PolicyConfig::LeastRecentlyUsed,
        PolicyConfig::PseudoLeastRecentlyUsed,
        PolicyConfig::NoAllocationOnWriteMiss,
        PolicyConfig::PrefetchNextLine,
        PolicyConfig::PrefetchNextLineOnMiss,
    ];

    /// The canonical name, as accepted by `from_str`
    pub fn name(&self) -> &'static str {
        match self {
            PolicyConfig::LeastRecentlyUsed => "LRU",
            PolicyConfig::PseudoLeastRecentlyUsed => "PLRU",
            PolicyConfig::NoAllocationOnWriteMiss => "NoAllocationOnWriteMiss",
            PolicyConfig::PrefetchNextLine => "PrefetchNextLine",
            PolicyConfig::PrefetchNextLineOnMiss => "PrefetchNextLineOnMiss",
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::LeastRecentlyUsed
    }
}

impl FromStr for PolicyConfig {
    type Err = CacheError;

    /// # Examples
    ///
    /// ```
    /// use replaylib::config::PolicyConfig;
    /// assert_eq!("plru".parse::<PolicyConfig>().unwrap(), PolicyConfig::PseudoLeastRecentlyUsed);
    /// assert_eq!("prefetchNextLineOnMiss".parse::<PolicyConfig>().unwrap(), PolicyConfig::PrefetchNextLineOnMiss);
    /// assert!("MRU".parse::<PolicyConfig>().is_err());
    /// ```
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lru" | "leastrecentlyused" => Ok(PolicyConfig::LeastRecentlyUsed),
            "plru" | "pseudolru" | "pseudoleastrecentlyused" => Ok(PolicyConfig::PseudoLeastRecentlyUsed),
            "nawm" | "noallocationonwritemiss" => Ok(PolicyConfig::NoAllocationOnWriteMiss),
            "pnl" | "prefetchnextline" => Ok(PolicyConfig::PrefetchNextLine),
            "pnlom" | "prefetchnextlineonmiss" => Ok(PolicyConfig::PrefetchNextLineOnMiss),
            _ => Err(CacheError::UnknownPolicy(name.to_string())),
        }
    }
}

impl TryFrom<String> for PolicyConfig {
    type Error = CacheError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<PolicyConfig> for String {
    fn from(policy: PolicyConfig) -> Self {
        policy.name().to_string()
    }
}

impl Display for PolicyConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How many ways a configuration asks for, before the cache size is known
///
/// Accepts `direct`, `full`, `4way`/`4-way`, or a bare number
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssociativityRepr", into = "AssociativityRepr")]
pub enum Associativity {
    Direct,
    Full,
    Ways(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AssociativityRepr {
    Count(u64),
    Name(String),
}

impl Associativity {
    /// Resolves to a number of ways for a cache of the given size
    pub fn ways(&self, cache_size: u64, line_size: u64) -> Result<u64, CacheError> {
        match self {
            Associativity::Direct => Ok(1),
            Associativity::Full => cache_size
                .checked_div(line_size)
                .ok_or_else(|| CacheError::invalid("a fully associative cache needs a non-zero line size")),
            Associativity::Ways(ways) => Ok(*ways),
        }
    }
}

impl FromStr for Associativity {
    type Err = CacheError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let captures = ASSOCIATIVITY_PATTERN
            .captures(input.trim())
            .ok_or_else(|| CacheError::invalid(format!("can't read associativity from {input:?}")))?;
        if captures.name("direct").is_some() {
            Ok(Associativity::Direct)
        } else if captures.name("full").is_some() {
            Ok(Associativity::Full)
        } else {
            let ways = captures.name("ways").map(|m| m.as_str()).unwrap_or_default();
            parse_number(ways, 1).map(Associativity::Ways)
        }
    }
}

impl TryFrom<AssociativityRepr> for Associativity {
    type Error = CacheError;

    fn try_from(repr: AssociativityRepr) -> Result<Self, Self::Error> {
        match repr {
            AssociativityRepr::Count(ways) => Ok(Associativity::Ways(ways)),
            AssociativityRepr::Name(name) => name.parse(),
        }
    }
}

impl From<Associativity> for AssociativityRepr {
    fn from(associativity: Associativity) -> Self {
        match associativity {
            Associativity::Direct => AssociativityRepr::Name("direct".to_string()),
            Associativity::Full => AssociativityRepr::Name("full".to_string()),
            Associativity::Ways(ways) => AssociativityRepr::Count(ways),
        }
    }
}

impl Display for Associativity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Associativity::Direct => f.write_str("direct"),
            Associativity::Full => f.write_str("full"),
            Associativity::Ways(ways) => write!(f, "{ways}way"),
        }
    }
}

/// One configuration to replay a trace against
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub cache_size: u64,
    pub line_size: u64,
    #[serde(alias = "ways", alias = "kind")]
    pub associativity: Associativity,
    #[serde(default, alias = "replacement_policy")]
    pub policy: PolicyConfig,
}

impl RunConfig {
    pub fn new(cache_size: u64, line_size: u64, associativity: Associativity, policy: PolicyConfig) -> Self {
        Self { cache_size, line_size, associativity, policy }
    }

    /// Resolves the associativity and validates the resulting geometry
    pub fn cache_config(&self) -> Result<CacheConfig, CacheError> {
        let ways = self.associativity.ways(self.cache_size, self.line_size)?;
        CacheConfig::new(self.cache_size, self.line_size, ways)
    }
}

impl FromStr for RunConfig {
    type Err = CacheError;

    /// Parses `SIZE:LINE:ASSOCIATIVITY:POLICY`. The size takes an optional `K` or `M` suffix
    ///
    /// # Examples
    ///
    /// ```
    /// use replaylib::config::{Associativity, PolicyConfig, RunConfig};
    /// let run: RunConfig = "16KB:32:4way:PLRU".parse().unwrap();
    /// assert_eq!(run.cache_size, 16384);
    /// assert_eq!(run.associativity, Associativity::Ways(4));
    /// assert_eq!(run.policy, PolicyConfig::PseudoLeastRecentlyUsed);
    /// ```
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let captures = RUN_PATTERN.captures(input).ok_or_else(|| {
            CacheError::invalid(format!("expected SIZE:LINE:ASSOCIATIVITY:POLICY, got {input:?}"))
        })?;
        let multiplier = match captures.name("size_unit").map(|m| m.as_str()) {
            Some("k" | "K") => 1 << 10,
            Some("m" | "M") => 1 << 20,
            _ => 1,
        };
        let cache_size = parse_number(&captures["size"], multiplier)?;
        let line_size = parse_number(&captures["line"], 1)?;
        let associativity = captures["assoc"].parse()?;
        let policy = captures["policy"].parse()?;
        Ok(RunConfig::new(cache_size, line_size, associativity, policy))
    }
}

impl Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}:{}", self.cache_size, self.line_size, self.associativity, self.policy)
    }
}

fn parse_number(digits: &str, multiplier: u64) -> Result<u64, CacheError> {
    digits
        .parse::<u64>()
        .ok()
        .and_then(|value| value.checked_mul(multiplier))
        .ok_or_else(|| CacheError::invalid(format!("{digits:?} is out of range")))
}
