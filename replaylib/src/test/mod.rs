use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use crate::trace::{AccessRecord, Operation};

mod config;
mod simulator;
mod sweep;

/// Seeded generator, so every run of the suite replays the same traces
pub(crate) fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A trace of `len` accesses over a small pool of lines, with roughly one store in four
pub(crate) fn synthetic_records(len: usize, seed: u64) -> Vec<AccessRecord> {
    let mut rng = seeded(seed);
    (0..len)
        .map(|_| {
            let line: u64 = rng.gen_range(0..2048);
            let offset: u64 = rng.gen_range(0..32);
            let operation = if rng.gen_bool(0.25) { Operation::Store } else { Operation::Load };
            AccessRecord { operation, address: 0x7fff_0000 + line * 32 + offset }
        })
        .collect()
}

/// The same records rendered in the textual trace format
pub(crate) fn render(records: &[AccessRecord]) -> String {
    records
        .iter()
        .map(|record| {
            let flag = match record.operation {
                Operation::Store => "S",
                Operation::Load => "L",
            };
            format!("{flag} {:x}\n", record.address)
        })
        .collect()
}
