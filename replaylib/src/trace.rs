use serde::{Deserialize, Serialize};
use crate::error::CacheError;

/// The kind of memory access in a trace record
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Load,
    Store,
}

impl Operation {
    /// `S` is a store, every other flag is treated as a load
    pub fn from_flag(flag: &[u8]) -> Self {
        if flag == b"S" {
            Operation::Store
        } else {
            Operation::Load
        }
    }
}

/// A single parsed access
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccessRecord {
    pub operation: Operation,
    pub address: u64,
}

impl AccessRecord {
    pub fn load(address: u64) -> Self {
        Self { operation: Operation::Load, address }
    }

    pub fn store(address: u64) -> Self {
        Self { operation: Operation::Store, address }
    }
}

/// Reads access records from a trace held in memory
///
/// The trace is a sequence of whitespace separated `<flag> <hex address>` pairs. Line breaks carry
/// no meaning, so a pair may be split across lines. The address may carry a `0x` prefix.
///
/// The first malformed record is reported as an error and ends the iteration. To replay a trace,
/// build a new `TraceRecords` over the same bytes
///
/// # Examples
///
/// ```
/// use replaylib::trace::{AccessRecord, TraceRecords};
/// let records: Vec<_> = TraceRecords::new(b"L 7fff5a8487c8\nS 0x10\n")
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(records, vec![AccessRecord::load(0x7fff5a8487c8), AccessRecord::store(0x10)]);
/// ```
#[derive(Debug, Clone)]
pub struct TraceRecords<'a> {
    bytes: &'a [u8],
    position: usize,
    record: usize,
    failed: bool,
}

impl<'a> TraceRecords<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            record: 0,
            failed: false,
        }
    }

    fn next_token(&mut self) -> Option<&'a [u8]> {
        let bytes = self.bytes;
        let start = self.position + bytes[self.position..].iter().position(|b| !b.is_ascii_whitespace())?;
        let end = bytes[start..]
            .iter()
            .position(u8::is_ascii_whitespace)
            .map_or(bytes.len(), |length| start + length);
        self.position = end;
        Some(&bytes[start..end])
    }

    fn malformed(&mut self, token: &[u8], reason: &'static str) -> CacheError {
        self.failed = true;
        CacheError::MalformedTraceRecord {
            record: self.record,
            token: String::from_utf8_lossy(token).into_owned(),
            reason,
        }
    }
}

impl Iterator for TraceRecords<'_> {
    type Item = Result<AccessRecord, CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let flag = self.next_token()?;
        self.record += 1;
        let Some(address) = self.next_token() else {
            return Some(Err(self.malformed(flag, "flag without an address")));
        };
        let digits = address
            .strip_prefix(b"0x")
            .or_else(|| address.strip_prefix(b"0X"))
            .unwrap_or(address);
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_hexdigit) {
            return Some(Err(self.malformed(address, "address is not hexadecimal")));
        }
        // All ASCII hex digits, so always valid UTF-8
        let parsed = std::str::from_utf8(digits)
            .ok()
            .and_then(|digits| u64::from_str_radix(digits, 16).ok());
        match parsed {
            Some(address) => Some(Ok(AccessRecord {
                operation: Operation::from_flag(flag),
                address,
            })),
            None => Some(Err(self.malformed(address, "address does not fit in 64 bits"))),
        }
    }
}
