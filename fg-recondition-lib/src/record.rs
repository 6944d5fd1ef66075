//! The fields and flags of an alignment record that reconditioning reads and rewrites.
//!
//! Records are noodles [`RecordBuf`]s; everything not touched here (sequence, qualities, CIGAR,
//! auxiliary data) is carried through unchanged.
use bstr::{BStr, ByteSlice};
use noodles::sam::alignment::{record::Flags, RecordBuf};

/// The byte that separates a read name from its mate suffix (e.g. `read/1`).
pub const MATE_SUFFIX_SEPARATOR: u8 = b'/';

/// The flags cleared when a record is unpaired.
pub const PAIRING_FLAGS: Flags = Flags::SEGMENTED
    .union(Flags::PROPERLY_SEGMENTED)
    .union(Flags::MATE_REVERSE_COMPLEMENTED)
    .union(Flags::MATE_UNMAPPED)
    .union(Flags::FIRST_SEGMENT)
    .union(Flags::LAST_SEGMENT);

/// Strips a trailing two-byte mate suffix (`/1`, `/2`, ...) from a read name, so that both mates
/// of a pair share the same name.  Names without such a suffix, or that would become empty, are
/// returned unchanged.  Only the last two bytes are considered: `a/bcd` is kept whole even though
/// it contains a `/`, and `a/b/1` becomes `a/b`.
pub fn strip_mate_suffix(name: &[u8]) -> &[u8] {
    match name {
        [prefix @ .., MATE_SUFFIX_SEPARATOR, _] if !prefix.is_empty() => prefix,
        _ => name,
    }
}

/// Replaces the record's name with its mate-suffix-stripped form.  Returns true if it changed.
pub fn normalize_read_name(record: &mut RecordBuf) -> bool {
    let Some(name) = record.name_mut() else {
        return false;
    };
    let len = strip_mate_suffix(name.as_slice()).len();
    if len == name.len() {
        false
    } else {
        name.truncate(len);
        true
    }
}

/// The record's name, or the empty name if it has none.
pub fn read_name(record: &RecordBuf) -> &BStr {
    record
        .name()
        .map(|name| name.as_bstr())
        .unwrap_or_else(|| b"".as_bstr())
}

/// True if the record asserts that its mate is mapped (the mate-unmapped flag is not set).
pub fn claims_mapped_mate(record: &RecordBuf) -> bool {
    !record.flags().is_mate_unmapped()
}

/// Clears every pairing-related flag: paired, proper pair, mate reverse, mate unmapped, first and
/// last segment.  The record's own unmapped/reverse flags are left alone.
pub fn unpair(record: &mut RecordBuf) {
    record.flags_mut().remove(PAIRING_FLAGS);
}
