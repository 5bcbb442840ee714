use std::collections::BTreeSet;

/// Bytecode offsets a node was built from. A plain value: composite nodes take the union of
/// their parts at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BytecodeOffsets(BTreeSet<u32>);

impl BytecodeOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(offset: u32) -> Self {
        Self(BTreeSet::from([offset]))
    }

    pub fn union(&self, other: &BytecodeOffsets) -> BytecodeOffsets {
        Self(self.0.union(&other.0).copied().collect())
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.0.contains(&offset)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for BytecodeOffsets {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a BytecodeOffsets {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}
