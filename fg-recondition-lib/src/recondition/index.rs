//! Name-keyed indices over the unmapped collection.  All keys are normalized read names (see
//! [`crate::record::strip_mate_suffix`]) and all values are positions in [`UnmappedReads`].
use bstr::{BString, ByteSlice};
use log::debug;
use std::collections::{hash_map::Entry, HashMap};

use super::reads::UnmappedReads;
use crate::record::claims_mapped_mate;

/// What [`NameIndex::observe`] found out about a name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Sighting {
    /// The first record with this name.
    First,
    /// A later record with a name already seen at position `first`; `count` is how many records
    /// with the name have been seen so far, including this one.
    Repeat { first: usize, count: usize },
}

#[derive(Copy, Clone, Debug)]
struct Seen {
    first: usize,
    count: usize,
}

/// Maps each read name to the position of the first unmapped record carrying it.
#[derive(Clone, Debug, Default)]
pub struct NameIndex {
    names: HashMap<BString, Seen>,
}

impl NameIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: HashMap::with_capacity(capacity),
        }
    }

    /// Records that the record at `position` carries `name`.  The first position seen for a name
    /// is the one kept.
    pub fn observe(&mut self, name: &[u8], position: usize) -> Sighting {
        match self.names.entry(BString::from(name)) {
            Entry::Occupied(mut entry) => {
                let seen = entry.get_mut();
                seen.count += 1;
                Sighting::Repeat {
                    first: seen.first,
                    count: seen.count,
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Seen {
                    first: position,
                    count: 1,
                });
                Sighting::First
            }
        }
    }

    /// The position of the first unmapped record with the given name.
    pub fn position<N: AsRef<[u8]>>(&self, name: N) -> Option<usize> {
        self.names.get(name.as_ref()).map(|seen| seen.first)
    }

    /// The number of distinct names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Unmapped records that claim their mate is mapped, waiting for that mate to be seen in the
/// mapped collection.
#[derive(Clone, Debug, Default)]
pub struct MateClaims {
    pending: HashMap<BString, usize>,
}

impl MateClaims {
    /// Collects every named record whose mate-unmapped flag is clear.  Must run after flag
    /// normalization, so that unmapped pairs are not mistaken for claims.  When several records
    /// share a name, the last one is kept.
    pub fn build(reads: &UnmappedReads) -> Self {
        let pending = reads
            .iter()
            .enumerate()
            .filter(|(_, record)| claims_mapped_mate(record))
            .filter_map(|(position, record)| {
                record
                    .name()
                    .map(|name| (BString::from(name.as_bytes()), position))
            })
            .collect::<HashMap<_, _>>();
        debug!("{} unmapped reads claim a mapped mate", pending.len());
        Self { pending }
    }

    /// Marks the claim for `name` as confirmed, i.e. its mate was found among the mapped reads.
    /// Returns true if a pending claim was removed.
    pub fn confirm<N: AsRef<[u8]>>(&mut self, name: N) -> bool {
        self.pending.remove(name.as_ref()).is_some()
    }

    #[cfg(test)]
    pub fn contains<N: AsRef<[u8]>>(&self, name: N) -> bool {
        self.pending.contains_key(name.as_ref())
    }

    /// The number of claims not yet confirmed.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The unconfirmed claims as `(name, position)`, ordered by position.
    pub fn into_unconfirmed(self) -> Vec<(BString, usize)> {
        let mut unconfirmed: Vec<_> = self.pending.into_iter().collect();
        unconfirmed.sort_unstable_by_key(|(_, position)| *position);
        unconfirmed
    }
}

#[cfg(test)]
impl<'a> FromIterator<(&'a bstr::BStr, usize)> for MateClaims {
    fn from_iter<T: IntoIterator<Item = (&'a bstr::BStr, usize)>>(iter: T) -> Self {
        Self {
            pending: iter
                .into_iter()
                .map(|(name, position)| (BString::from(name.as_bytes()), position))
                .collect(),
        }
    }
}
