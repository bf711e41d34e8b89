use std::fs::File;
use std::ops::Deref;
use crate::error::CacheError;

/// The bytes of a trace file, either memory mapped or read in full
pub enum TraceBytes {
    #[cfg(unix)]
    Mapped(memmap2::Mmap),
    Buffered(Vec<u8>),
}

impl Deref for TraceBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            #[cfg(unix)]
            TraceBytes::Mapped(map) => &map[..],
            TraceBytes::Buffered(bytes) => &bytes[..],
        }
    }
}

/// Gets the whole trace as one byte slice, so every configuration can re-read it from the start
///
/// Memory maps the file for speed on unix systems. Reads are advised as sequential, which is how
/// every run walks the trace
#[cfg(unix)]
pub fn map_trace(file: File) -> Result<TraceBytes, CacheError> {
    use memmap2::{Advice, Mmap};
    // Mapping an empty file fails on some platforms
    if file.metadata()?.len() == 0 {
        return Ok(TraceBytes::Buffered(Vec::new()));
    }
    // The mapping is read only and the trace is not expected to change while we replay it
    let map = unsafe { Mmap::map(&file)? };
    map.advise(Advice::Sequential)?;
    Ok(TraceBytes::Mapped(map))
}

/// Gets the whole trace as one byte slice, so every configuration can re-read it from the start
#[cfg(not(unix))]
pub fn map_trace(mut file: File) -> Result<TraceBytes, CacheError> {
    use std::io::Read;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(TraceBytes::Buffered(bytes))
}
