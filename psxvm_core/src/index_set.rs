//! A bitset of small integer indices with fast sparse iteration.

use log::debug;

const WORD_BITS: u32 = u64::BITS;

/// A set of indices in `0..capacity`, backed by one bit per index.
///
/// Membership tests, insertions and removals are O(1). Iteration skips whole empty words at a
/// time, which keeps per-frame walks over large, mostly empty tables (e.g. texture cache slots)
/// cheap.
#[derive(Debug, Clone, Default)]
pub struct FixedIndexSet {
    words: Vec<u64>,
    capacity: u32,
}

impl FixedIndexSet {
    /// Creates a new, empty set able to hold indices in `0..capacity`.
    pub fn new(capacity: u32) -> Self {
        let mut set = Self::default();
        set.init(capacity);
        set
    }

    /// (Re)initializes the set for indices in `0..capacity` and removes every member. Storage is
    /// only reallocated if the capacity changes.
    pub fn init(&mut self, capacity: u32) {
        if capacity != self.capacity {
            let words = capacity.div_ceil(WORD_BITS) as usize;
            debug!(
                target: "psxvm_core::index_set",
                "reallocating index set: {} -> {} indices ({} words)",
                self.capacity,
                capacity,
                words
            );

            self.words = vec![0; words];
            self.capacity = capacity;
        } else {
            self.remove_all();
        }
    }

    #[inline(always)]
    fn locate(&self, index: u32) -> (usize, u64) {
        assert!(
            index < self.capacity,
            "index {index} out of range (capacity is {})",
            self.capacity
        );

        ((index / WORD_BITS) as usize, 1 << (index % WORD_BITS))
    }

    /// Whether `index` is a member of this set.
    #[inline(always)]
    pub fn is_added(&self, index: u32) -> bool {
        let (word, mask) = self.locate(index);
        self.words[word] & mask != 0
    }

    /// Adds `index` to this set. Adding an existing member does nothing.
    #[inline(always)]
    pub fn add(&mut self, index: u32) {
        let (word, mask) = self.locate(index);
        self.words[word] |= mask;
    }

    /// Removes `index` from this set. Removing a non-member does nothing.
    #[inline(always)]
    pub fn remove(&mut self, index: u32) {
        let (word, mask) = self.locate(index);
        self.words[word] &= !mask;
    }

    /// Removes every member of this set.
    pub fn remove_all(&mut self) {
        self.words.fill(0);
    }

    /// Calls `visitor` with every member of this set, in ascending order.
    pub fn for_each_index(&self, mut visitor: impl FnMut(u32)) {
        for (word_index, &word) in self.words.iter().enumerate() {
            let mut bits = word;
            let mut index = word_index as u32 * WORD_BITS;

            while bits != 0 {
                let skip = bits.trailing_zeros();
                index += skip;
                visitor(index);

                // consume the bit we just visited. shifting by 64 is not allowed, so split it
                bits = (bits >> skip) >> 1;
                index += 1;
            }
        }
    }

    /// Returns an iterator over the members of this set, in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            next_word: 0,
            bits: 0,
            index: 0,
        }
    }

    /// The capacity of this set, i.e. one past the largest index it can hold.
    ///
    /// Note that this is _not_ the number of members: see [`FixedIndexSet::count`] for that.
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.capacity
    }

    /// The number of members of this set.
    pub fn count(&self) -> u32 {
        self.words.iter().map(|word| word.count_ones()).sum()
    }
}

impl<'a> IntoIterator for &'a FixedIndexSet {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the members of a [`FixedIndexSet`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    words: &'a [u64],
    next_word: usize,
    /// Remaining bits of the current word, shifted so that bit 0 corresponds to `index`.
    bits: u64,
    index: u32,
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        while self.bits == 0 {
            let word = *self.words.get(self.next_word)?;
            self.index = self.next_word as u32 * WORD_BITS;
            self.bits = word;
            self.next_word += 1;
        }

        let skip = self.bits.trailing_zeros();
        let index = self.index + skip;

        self.bits = (self.bits >> skip) >> 1;
        self.index = index + 1;

        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn starts_empty() {
        let set = FixedIndexSet::new(200);
        assert_eq!(set.size(), 200);
        assert_eq!(set.count(), 0);
        assert!((0..200).all(|i| !set.is_added(i)));
        assert_eq!(set.iter().next(), None);
    }

    #[test]
    fn word_boundaries() {
        let mut set = FixedIndexSet::new(193);
        for index in [0, 63, 64, 127, 128, 192] {
            set.add(index);
        }

        let mut visited = Vec::new();
        set.for_each_index(|i| visited.push(i));

        assert_eq!(visited, [0, 63, 64, 127, 128, 192]);
        assert_eq!(set.iter().collect::<Vec<_>>(), visited);
        assert_eq!(set.count(), 6);
    }

    #[test]
    fn remove_and_remove_all() {
        let mut set = FixedIndexSet::new(10);
        set.add(3);
        set.add(3);
        set.add(9);
        assert_eq!(set.count(), 2);

        set.remove(3);
        assert!(!set.is_added(3));
        assert!(set.is_added(9));

        set.remove_all();
        assert_eq!(set.iter().count(), 0);
        assert_eq!(set.size(), 10);
    }

    #[test]
    fn reinit_clears() {
        let mut set = FixedIndexSet::new(100);
        set.add(42);

        set.init(100);
        assert!(!set.is_added(42));

        set.add(99);
        set.init(300);
        assert_eq!(set.size(), 300);
        assert!((0..300).all(|i| !set.is_added(i)));
    }

    #[test]
    fn zero_capacity() {
        let set = FixedIndexSet::new(0);
        assert_eq!(set.size(), 0);
        set.for_each_index(|_| panic!("empty set visited an index"));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_past_capacity_panics() {
        let mut set = FixedIndexSet::new(64);
        set.add(64);
    }

    proptest::proptest! {
        #[test]
        fn matches_btreeset(capacity in 1u32..1000, ops in proptest::collection::vec((any::<u32>(), any::<bool>()), 0..200)) {
            let mut set = FixedIndexSet::new(capacity);
            let mut reference = BTreeSet::new();

            for (index, add) in ops {
                let index = index % capacity;
                if add {
                    set.add(index);
                    reference.insert(index);
                } else {
                    set.remove(index);
                    reference.remove(&index);
                }
            }

            let mut visited = Vec::new();
            set.for_each_index(|i| visited.push(i));

            let expected = reference.into_iter().collect::<Vec<_>>();
            prop_assert_eq!(&visited, &expected);
            prop_assert_eq!(set.iter().collect::<Vec<_>>(), expected);
            prop_assert_eq!(set.count() as usize, visited.len());
        }
    }
}
