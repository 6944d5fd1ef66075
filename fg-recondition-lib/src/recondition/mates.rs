//! Reconciliation of unmapped reads against the stream of mapped reads.
use log::debug;
use noodles::{core::Position, sam::alignment::RecordBuf};

use super::{
    index::{MateClaims, NameIndex},
    reads::UnmappedReads,
};
use crate::{record::read_name, reference::ReferenceTable};

/// Counts of what was seen and changed while streaming the mapped reads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// The number of mapped records streamed.
    pub mapped_records: u64,
    /// Unmapped records whose position fields were rewritten from their mapped mate.
    pub mates_standardized: usize,
    /// Unmapped records whose claim of a mapped mate was confirmed.
    pub claims_confirmed: usize,
    /// Mapped records whose reference is not in the unmapped reference table.
    pub untranslatable_references: usize,
}

/// Streams mapped records, one at a time, against the in-memory unmapped reads.
///
/// For a mapped record whose mate is unmapped, the unmapped mate (if present) takes the mapped
/// record's reference and position, so that downstream tools see the pair placed together.  Every
/// mapped record also confirms any pending claim made by an unmapped read of the same name.
pub struct MateReconciler<'a> {
    mapped_references: &'a ReferenceTable,
    unmapped_references: &'a ReferenceTable,
    index: &'a NameIndex,
    summary: ReconcileSummary,
}

impl<'a> MateReconciler<'a> {
    pub fn new(
        mapped_references: &'a ReferenceTable,
        unmapped_references: &'a ReferenceTable,
        index: &'a NameIndex,
    ) -> Self {
        Self {
            mapped_references,
            unmapped_references,
            index,
            summary: ReconcileSummary::default(),
        }
    }

    /// Applies one mapped record to the unmapped reads and the pending claims.
    pub fn observe(
        &mut self,
        mapped: &RecordBuf,
        reads: &mut UnmappedReads,
        claims: &mut MateClaims,
    ) {
        self.summary.mapped_records += 1;
        let name = read_name(mapped);

        if mapped.flags().is_mate_unmapped() {
            if let Some(unmapped) = self
                .index
                .position(name)
                .and_then(|position| reads.get_mut(position))
            {
                debug!("Standardizing fields of unmapped read: {name}");
                let reference_id = self.translate(mapped);
                *unmapped.reference_sequence_id_mut() = reference_id;
                *unmapped.mate_reference_sequence_id_mut() = reference_id;
                *unmapped.alignment_start_mut() = mapped.alignment_start();
                // The first base of the reference, i.e. zero in BAM's 0-based encoding.
                *unmapped.mate_alignment_start_mut() = Some(Position::MIN);
                self.summary.mates_standardized += 1;
            }
        }

        if claims.confirm(name) {
            self.summary.claims_confirmed += 1;
        }
    }

    /// The mapped record's reference id in the unmapped reference table's id space.
    fn translate(&mut self, mapped: &RecordBuf) -> Option<usize> {
        let id = mapped.reference_sequence_id()?;
        let translated = self
            .mapped_references
            .translate(id, self.unmapped_references);
        if translated.is_none() {
            debug!(
                "Reference {} of mapped read {} is not in the unmapped reads' header",
                self.mapped_references
                    .name(id)
                    .map_or_else(|| id.to_string(), ToString::to_string),
                read_name(mapped)
            );
            self.summary.untranslatable_references += 1;
        }
        translated
    }

    pub fn finish(self) -> ReconcileSummary {
        self.summary
    }
}
