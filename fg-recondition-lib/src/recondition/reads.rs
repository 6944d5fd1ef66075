use noodles::sam::alignment::RecordBuf;
use std::ops::{Index, IndexMut};

/// The unmapped collection held in memory, in its original order.
///
/// Records are addressed by their position in the input, which never changes: stages only rewrite
/// fields of the record at a position, they never insert, remove or reorder records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnmappedReads {
    records: Vec<RecordBuf>,
}

impl UnmappedReads {
    pub fn new(records: Vec<RecordBuf>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut RecordBuf> {
        self.records.get_mut(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordBuf> + '_ {
        self.records.iter()
    }
}

impl Index<usize> for UnmappedReads {
    type Output = RecordBuf;

    fn index(&self, position: usize) -> &Self::Output {
        &self.records[position]
    }
}

impl IndexMut<usize> for UnmappedReads {
    fn index_mut(&mut self, position: usize) -> &mut Self::Output {
        &mut self.records[position]
    }
}

#[cfg(test)]
impl FromIterator<RecordBuf> for UnmappedReads {
    fn from_iter<T: IntoIterator<Item = RecordBuf>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
