use std::path::{Path, PathBuf};

/// Returns the file name of `path` with `suffix` inserted between its stem and its extension,
/// e.g. `unmapped.bam` with `_fixup` becomes `unmapped_fixup.bam`.
///
/// Only the final extension is treated as such, so `reads.sorted.bam` becomes
/// `reads.sorted_fixup.bam`.  A path without an extension simply gains the suffix.
pub fn with_suffix_before_extension<P: AsRef<Path>>(path: &P, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    let stem = path.file_stem().map_or_else(Default::default, |s| s.to_string_lossy());
    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    PathBuf::from(name)
}
