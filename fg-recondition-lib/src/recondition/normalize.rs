//! Normalization applied to every unmapped record before reconciliation.
use bstr::{BString, ByteSlice};
use log::{debug, warn};
use noodles::sam::alignment::record::{Flags, MappingQuality};

use super::{
    index::{NameIndex, Sighting},
    reads::UnmappedReads,
};
use crate::record::normalize_read_name;

/// Counts of the changes made while normalizing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    /// Records whose name had a mate suffix stripped.
    pub names_normalized: usize,
    /// Repeated names for which the mate-unmapped flag was set on both records.
    pub mate_unmapped_fixed: usize,
    /// Names carried by more than two unmapped records.
    pub anomalous_names: usize,
}

/// Normalizes every unmapped record, in order, and returns the index of the first position of each
/// (normalized) name.
///
/// For each record:
/// 1. the mate suffix is stripped from the name;
/// 2. if the name was already seen, both the first record with the name and this record get the
///    mate-unmapped flag: two unmapped records sharing a name are an unmapped pair, whatever the
///    aligner said;
/// 3. the mapping quality is set to zero.
///
/// Names seen more than twice are reported as anomalies; every repeat is still flagged along with
/// the first record.
pub fn normalize(reads: &mut UnmappedReads) -> (NameIndex, NormalizeSummary) {
    let mut index = NameIndex::with_capacity(reads.len());
    let mut summary = NormalizeSummary::default();

    for position in 0..reads.len() {
        let record = &mut reads[position];
        if normalize_read_name(record) {
            summary.names_normalized += 1;
        }
        *record.mapping_quality_mut() = MappingQuality::new(0);

        let Some(name) = record.name().map(|name| BString::from(name.as_bytes())) else {
            continue;
        };
        if let Sighting::Repeat { first, count } = index.observe(&name, position) {
            debug!("Setting missing 0x8 flag for unmapped read-pair: {name}");
            record.flags_mut().insert(Flags::MATE_UNMAPPED);
            reads[first].flags_mut().insert(Flags::MATE_UNMAPPED);
            if count == 2 {
                summary.mate_unmapped_fixed += 1;
            } else if count == 3 {
                warn!("Read name {name} is shared by more than two unmapped reads");
                summary.anomalous_names += 1;
            }
        }
    }

    (index, summary)
}
