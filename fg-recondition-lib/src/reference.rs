//! Per-collection reference sequence tables.
//!
//! Each BAM numbers its reference sequences by their order in its own header, so the id of a
//! reference in the mapped BAM cannot be reused in the unmapped BAM.  Ids are moved between the two
//! only through [`ReferenceTable::translate`], which goes through the reference name.
use bstr::{BStr, BString, ByteSlice};
use noodles::sam::Header;
use std::collections::HashMap;

/// An ordered table of reference sequence names, with lookups in both directions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    names: Vec<BString>,
    ids: HashMap<BString, usize>,
}

impl ReferenceTable {
    /// Builds the table from reference names in id order.
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<BString>,
    {
        let names: Vec<BString> = names.into_iter().map(Into::into).collect();
        let mut ids = HashMap::with_capacity(names.len());
        for (id, name) in names.iter().enumerate() {
            // Header reference names are unique, but keep the first if they are not.
            ids.entry(name.clone()).or_insert(id);
        }
        Self { names, ids }
    }

    /// Builds the table from the `@SQ` records of a SAM header.
    pub fn from_header(header: &Header) -> Self {
        Self::new(header.reference_sequences().keys().cloned())
    }

    /// The number of reference sequences.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The name of the reference with the given id.
    pub fn name(&self, id: usize) -> Option<&BStr> {
        self.names.get(id).map(|name| name.as_bstr())
    }

    /// The id of the reference with the given name.
    pub fn id<N: AsRef<[u8]>>(&self, name: N) -> Option<usize> {
        self.ids.get(name.as_ref()).copied()
    }

    /// Translates a reference id from this table's id space into `other`'s, by name.  Returns
    /// `None` if the id is unknown here or the name is unknown in `other`.
    pub fn translate(&self, id: usize, other: &ReferenceTable) -> Option<usize> {
        self.name(id).and_then(|name| other.id(name))
    }
}
