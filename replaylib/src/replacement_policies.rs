/// The per-set state a replacement policy keeps. A cache owns one of these for every set
///
/// Slots are either empty or hold the tag of the resident line. Nothing else is tracked, main
/// memory is not modelled so there is no dirty state
pub trait ReplacementPolicy {
    /// Creates an empty set with `ways` slots. The slot count never changes afterwards
    fn with_ways(ways: usize) -> Self
    where
        Self: Sized;

    /// Looks for `tag` in the set, refreshing its recency when it is resident
    ///
    /// returns: bool, true on a hit
    fn lookup(&mut self, tag: u64) -> bool;

    /// Places `tag` in the set after a miss, evicting a resident line if the policy picks an
    /// occupied slot
    ///
    /// Callers must only use this for tags that are not resident
    ///
    /// returns: Option<u64>, the evicted tag
    fn insert_on_miss(&mut self, tag: u64) -> Option<u64>;

    /// The raw slots of the set, in way order
    fn slots(&self) -> &[Option<u64>];

    /// Checks residency without touching any recency state
    fn contains(&self, tag: u64) -> bool {
        self.slots().contains(&Some(tag))
    }

    /// Gets the number of empty slots. Useful for analysing how much of a cache a trace warms
    fn empty_ways(&self) -> usize {
        self.slots().iter().filter(|slot| slot.is_none()).count()
    }
}

/// Exact least recently used ordering
///
/// The slots themselves hold the order: leftmost is least recently used, the last occupied slot
/// is most recently used, and empty slots trail behind the occupied ones
#[derive(Debug, Clone)]
pub struct LeastRecentlyUsed {
    slots: Vec<Option<u64>>,
}

impl LeastRecentlyUsed {
    /// Number of leading occupied slots. Occupied slots are always packed to the left
    fn occupied(&self) -> usize {
        self.slots.iter().take_while(|slot| slot.is_some()).count()
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn with_ways(ways: usize) -> Self {
        Self { slots: vec![None; ways] }
    }

    fn lookup(&mut self, tag: u64) -> bool {
        match self.slots.iter().position(|slot| *slot == Some(tag)) {
            Some(position) => {
                // Shift everything more recent one step left and put the hit at the MRU end
                let occupied = self.occupied();
                self.slots[position..occupied].rotate_left(1);
                true
            }
            None => false,
        }
    }

    fn insert_on_miss(&mut self, tag: u64) -> Option<u64> {
        if let Some(empty) = self.slots.iter().position(Option::is_none) {
            self.slots[empty] = Some(tag);
            return None;
        }
        let evicted = self.slots[0].take();
        self.slots.rotate_left(1);
        if let Some(last) = self.slots.last_mut() {
            *last = Some(tag);
        }
        evicted
    }

    fn slots(&self) -> &[Option<u64>] {
        &self.slots
    }
}

/// Tree based pseudo LRU
///
/// A complete binary tree with one leaf per way and `ways - 1` internal nodes, kept as a flat
/// breadth first array where node `i` has children `2i + 1` and `2i + 2`. Each node holds one
/// hot/cold bit: `false` means the left subtree is hot and the right subtree is the victim path,
/// `true` is the mirror image. Every bit starts `false`.
///
/// A miss walks from the root down the cold children to a victim leaf, flipping each bit on the
/// way so the path just taken becomes hot. A hit walks from its leaf up to the root, pointing every
/// ancestor away from the leaf. The victim leaf is used whether or not its slot is already empty.
///
/// Needs a power of two number of ways, otherwise the tree is not complete
#[derive(Debug, Clone)]
pub struct PseudoLeastRecentlyUsed {
    slots: Vec<Option<u64>>,
    tree: Vec<bool>,
}

impl PseudoLeastRecentlyUsed {
    /// The hot/cold bits in breadth first order
    pub fn tree(&self) -> &[bool] {
        &self.tree
    }

    /// Index of the first leaf if the leaves were stored after the internal nodes
    fn first_leaf(&self) -> usize {
        self.tree.len()
    }

    /// Descends along the cold path, flipping as it goes, and returns the way it lands on
    fn take_victim(&mut self) -> usize {
        let mut node = 0;
        while node < self.first_leaf() {
            let right_is_hot = self.tree[node];
            self.tree[node] = !right_is_hot;
            node = if right_is_hot { 2 * node + 1 } else { 2 * node + 2 };
        }
        node - self.first_leaf()
    }

    /// Marks every ancestor of `way` as pointing towards it
    fn touch(&mut self, way: usize) {
        let mut node = self.first_leaf() + way;
        while node > 0 {
            let parent = (node - 1) / 2;
            // Odd nodes are left children
            self.tree[parent] = node % 2 == 0;
            node = parent;
        }
    }
}

impl ReplacementPolicy for PseudoLeastRecentlyUsed {
    fn with_ways(ways: usize) -> Self {
        debug_assert!(ways.is_power_of_two(), "PLRU needs a power of two number of ways");
        Self {
            slots: vec![None; ways],
            tree: vec![false; ways.saturating_sub(1)],
        }
    }

    fn lookup(&mut self, tag: u64) -> bool {
        match self.slots.iter().position(|slot| *slot == Some(tag)) {
            Some(way) => {
                self.touch(way);
                true
            }
            None => false,
        }
    }

    fn insert_on_miss(&mut self, tag: u64) -> Option<u64> {
        let way = self.take_victim();
        self.slots[way].replace(tag)
    }

    fn slots(&self) -> &[Option<u64>] {
        &self.slots
    }
}
