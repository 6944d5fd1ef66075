use log::debug;

use super::{index::MateClaims, reads::UnmappedReads};
use crate::record::unpair;

/// Unpairs every unmapped read whose claimed mapped mate never appeared in the mapped reads.
///
/// Must only be called once all mapped reads have been seen.  Returns the number of reads
/// unpaired.
pub fn resolve_orphans(reads: &mut UnmappedReads, claims: MateClaims) -> usize {
    let mut unpaired = 0;
    for (name, position) in claims.into_unconfirmed() {
        if let Some(record) = reads.get_mut(position) {
            debug!("Mapped mate not found, unpairing unmapped read: {name}");
            unpair(record);
            unpaired += 1;
        }
    }
    unpaired
}
