//! Reading the input BAMs and writing the corrected one.
use noodles::{
    bam,
    sam::{
        alignment::{io::Write as _, RecordBuf},
        Header,
    },
};
#[cfg(unix)]
use std::{fs::Permissions, os::unix::fs::PermissionsExt};
use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use crate::{
    errors::{ReconditionError, Role},
    interrupt::InterruptFlag,
};

/// An open input BAM whose header has been read.
pub struct BamInput<R> {
    role: Role,
    path: PathBuf,
    reader: bam::io::Reader<R>,
    header: Header,
}

/// Opens the BAM at `path` and reads its header.  Failures name the file and its role.
pub fn open_bam(role: Role, path: &Path) -> Result<BamInput<impl Read>, ReconditionError> {
    let file = File::open(path).map_err(|source| ReconditionError::InputAccess {
        role,
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = bam::io::Reader::new(file);
    let header = reader
        .read_header()
        .map_err(|source| ReconditionError::MalformedHeader {
            role,
            path: path.to_path_buf(),
            source,
        })?;
    Ok(BamInput {
        role,
        path: path.to_path_buf(),
        reader,
        header,
    })
}

impl<R: Read> BamInput<R> {
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Iterates over the remaining records in file order.
    pub fn records(&mut self) -> impl Iterator<Item = Result<RecordBuf, ReconditionError>> + '_ {
        let Self {
            role,
            path,
            reader,
            header,
        } = self;
        let role = *role;
        reader.record_bufs(header).map(move |result| {
            result.map_err(|source| ReconditionError::InputRecord {
                role,
                path: path.clone(),
                source,
            })
        })
    }

    /// Closes the input, keeping its header.
    pub fn into_header(self) -> Header {
        self.header
    }
}

/// Permissions of the output BAM; temporary files are created readable by their owner only.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Writes `header` and `records` to a BAM at `path`.
///
/// The BAM is written to a temporary file in the same directory and only renamed to `path` once
/// it is complete.  If writing fails or `interrupt` is raised the temporary file is removed, so
/// no truncated BAM is ever left at `path`.
pub fn write_bam<'r, I>(
    path: &Path,
    header: &Header,
    records: I,
    interrupt: &InterruptFlag,
) -> Result<(), ReconditionError>
where
    I: IntoIterator<Item = &'r RecordBuf>,
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = tempfile::Builder::new()
        .prefix(".recondition-")
        .suffix(".bam.tmp")
        .tempfile_in(directory)
        .map_err(|source| output_error(path, source))?;

    write_records(path, temp.as_file(), header, records, interrupt)?;

    #[cfg(unix)]
    temp.as_file()
        .set_permissions(Permissions::from_mode(OUTPUT_MODE))
        .map_err(|source| output_error(path, source))?;
    temp.persist(path).map_err(|e| output_error(path, e.error))?;
    Ok(())
}

fn output_error(path: &Path, source: io::Error) -> ReconditionError {
    ReconditionError::OutputWrite {
        path: path.to_path_buf(),
        source,
    }
}

fn write_records<'r, I>(
    path: &Path,
    file: &File,
    header: &Header,
    records: I,
    interrupt: &InterruptFlag,
) -> Result<(), ReconditionError>
where
    I: IntoIterator<Item = &'r RecordBuf>,
{
    let mut writer = bam::io::Writer::new(file);
    writer
        .write_header(header)
        .map_err(|source| output_error(path, source))?;
    for record in records {
        interrupt.check()?;
        writer
            .write_alignment_record(header, record)
            .map_err(|source| output_error(path, source))?;
    }
    writer
        .into_inner()
        .finish()
        .map_err(|source| output_error(path, source))?;
    file.sync_all().map_err(|source| output_error(path, source))
}
