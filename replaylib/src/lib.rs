//! # ReplayLib
//!
//! ReplayLib replays memory access traces against a modelled cache and counts hits and accesses
//!
//! It provides one cache implementation parameterised by its per-set replacement state (exact LRU
//! or a pseudo LRU hot/cold tree), and a policy engine layered on top which decides whether store
//! misses allocate and when the next line is prefetched
//!
//! Misses refill instantly, there is no timing, no hierarchy and no main memory model

/// Splits addresses into tag, set index and offset
pub mod address;

/// Contains the cache, the per-cache set array, and the enum used to dispatch over cache types
pub mod cache;

/// Contains the cache geometry, the policy names, and the run descriptions used by sweeps
pub mod config;

/// Contains the error type shared by the whole library
pub mod error;

/// Contains the helpers used to get a trace file into memory
pub mod io;

/// Contains the policy engine deciding allocation and prefetching on each access
pub mod policy;

/// Contains the per-set replacement states, with a trait for implementing others
pub mod replacement_policies;

/// Contains the simulator used to replay a trace against one cache configuration
pub mod simulator;

/// Contains the sweep of configurations a trace is evaluated against
pub mod sweep;

/// Contains the trace record types and the textual trace reader
pub mod trace;

#[cfg(test)]
mod test;
