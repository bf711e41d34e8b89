use crate::config::CacheConfig;
use crate::error::CacheError;

/// An address split into the fields a cache cares about
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DecomposedAddress {
    /// Every bit above the index and offset
    pub tag: u64,
    /// The set the address maps to
    pub index: usize,
    /// The byte within the line
    pub offset: u64,
}

/// Splits addresses into tag, set index and line offset using bit masks
///
/// Both the line size and the set count have to be powers of two, which is what makes the masks
/// exact. A single set degenerates to an index that is always 0
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AddressDecomposer {
    offset_bits: u32,
    index_bits: u32,
    offset_mask: u64,
    index_mask: u64,
}

impl AddressDecomposer {
    pub fn new(line_size: u64, num_sets: u64) -> Result<Self, CacheError> {
        if !line_size.is_power_of_two() {
            return Err(CacheError::invalid(format!("line size {line_size} is not a power of two")));
        }
        if !num_sets.is_power_of_two() {
            return Err(CacheError::invalid(format!("set count {num_sets} is not a power of two")));
        }
        Ok(Self {
            offset_bits: line_size.trailing_zeros(),
            index_bits: num_sets.trailing_zeros(),
            offset_mask: line_size - 1,
            index_mask: num_sets - 1,
        })
    }

    pub fn for_config(config: &CacheConfig) -> Result<Self, CacheError> {
        Self::new(config.line_size(), config.num_sets())
    }

    /// # Examples
    ///
    /// ```
    /// use replaylib::address::AddressDecomposer;
    /// // 32B lines, 256 sets
    /// let decomposer = AddressDecomposer::new(32, 256).unwrap();
    /// let fields = decomposer.decompose(0x1234_5678);
    /// assert_eq!(fields.offset, 0x18);
    /// assert_eq!(fields.index, 0xb3);
    /// assert_eq!(fields.tag, 0x1234_5678 >> 13);
    /// ```
    #[inline]
    pub fn decompose(&self, address: u64) -> DecomposedAddress {
        DecomposedAddress {
            // A 64 bit wide index and offset leaves nothing for the tag
            tag: address.checked_shr(self.offset_bits + self.index_bits).unwrap_or(0),
            index: ((address >> self.offset_bits) & self.index_mask) as usize,
            offset: address & self.offset_mask,
        }
    }
}

/// One-off decomposition against a configuration
pub fn decompose(address: u64, config: &CacheConfig) -> Result<DecomposedAddress, CacheError> {
    Ok(AddressDecomposer::for_config(config)?.decompose(address))
}
