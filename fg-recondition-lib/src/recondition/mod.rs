//! Reconditioning of TopHat's unmapped reads.
//!
//! The unmapped reads are held in memory and pass through the following stages, each handing its
//! results to the next:
//! 1. [`normalize`]: strip mate suffixes from names, flag unmapped pairs as such, zero the mapping
//!    quality, and index the first position of every name.
//! 2. [`MateClaims::build`]: collect the reads that claim a mapped mate.
//! 3. [`MateReconciler`]: stream the mapped reads once, placing unmapped reads at their mapped
//!    mate's position and confirming claims.
//! 4. [`resolve_orphans`]: unpair reads whose claimed mapped mate never showed up.
//!
//! The number and order of the unmapped reads never change.
pub mod index;
pub mod mates;
pub mod normalize;
pub mod orphans;
pub mod reads;

pub use index::{MateClaims, NameIndex};
pub use mates::{MateReconciler, ReconcileSummary};
pub use normalize::{normalize, NormalizeSummary};
pub use orphans::resolve_orphans;
pub use reads::UnmappedReads;

use log::info;
use noodles::sam::alignment::RecordBuf;

use crate::reference::ReferenceTable;

/// Everything a reconditioning run counted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FixupSummary {
    /// The number of unmapped records read (and written).
    pub unmapped_records: usize,
    pub normalize: NormalizeSummary,
    pub reconcile: ReconcileSummary,
    /// Unmapped reads unpaired because their claimed mapped mate was absent.
    pub orphans_unpaired: usize,
}

impl FixupSummary {
    /// Logs the summary at info level.
    pub fn log(&self) {
        info!("Unmapped reads: {}", self.unmapped_records);
        info!("Mapped reads: {}", self.reconcile.mapped_records);
        info!("Read names with a mate suffix removed: {}", self.normalize.names_normalized);
        info!(
            "Unmapped read-pairs given the missing 0x8 flag: {}",
            self.normalize.mate_unmapped_fixed
        );
        info!(
            "Unmapped reads standardized from their mapped mate: {}",
            self.reconcile.mates_standardized
        );
        info!("Unmapped reads unpaired for lack of a mapped mate: {}", self.orphans_unpaired);
        if self.normalize.anomalous_names > 0 {
            info!(
                "Read names shared by more than two unmapped reads: {}",
                self.normalize.anomalous_names
            );
        }
        if self.reconcile.untranslatable_references > 0 {
            info!(
                "Mapped reads on references missing from the unmapped header: {}",
                self.reconcile.untranslatable_references
            );
        }
    }
}

/// Runs all stages over the unmapped records and a single pass of the mapped records, returning the
/// corrected unmapped reads.
///
/// The mapped records are consumed lazily and never collected; the first error they yield stops
/// the run and is returned.
pub fn recondition<I, E>(
    unmapped: Vec<RecordBuf>,
    mapped: I,
    mapped_references: &ReferenceTable,
    unmapped_references: &ReferenceTable,
) -> Result<(UnmappedReads, FixupSummary), E>
where
    I: IntoIterator<Item = Result<RecordBuf, E>>,
{
    let mut reads = UnmappedReads::new(unmapped);
    let (index, normalize_summary) = normalize(&mut reads);
    let mut claims = MateClaims::build(&reads);

    let mut reconciler = MateReconciler::new(mapped_references, unmapped_references, &index);
    for record in mapped {
        reconciler.observe(&record?, &mut reads, &mut claims);
    }
    let reconcile_summary = reconciler.finish();

    let orphans_unpaired = resolve_orphans(&mut reads, claims);

    let summary = FixupSummary {
        unmapped_records: reads.len(),
        normalize: normalize_summary,
        reconcile: reconcile_summary,
        orphans_unpaired,
    };
    Ok((reads, summary))
}
