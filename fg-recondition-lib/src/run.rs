use anyhow::Result;
use derive_builder::Builder;
use log::info;
use noodles::sam::{alignment::RecordBuf, header::record::value::map::program::tag, Header};
use proglog::{CountFormatterKind, ProgLogBuilder};
use std::path::PathBuf;

use crate::{
    errors::{ReconditionError, Role},
    interrupt::InterruptFlag,
    io::{open_bam, write_bam},
    recondition::{recondition, FixupSummary},
    reference::ReferenceTable,
    util::{
        header::{append_program, ProgramInfo},
        io::with_suffix_before_extension,
        version::built_info::VERSION,
    },
};

/// The name under which this tool records itself in the output header.
pub const TOOL_NAME: &str = "recondition";

/// The BAM with the mapped reads in a TopHat output directory.
pub const MAPPED_FILE_NAME: &str = "accepted_hits.bam";

/// The BAM with the unmapped reads in a TopHat output directory.
pub const UNMAPPED_FILE_NAME: &str = "unmapped.bam";

/// Inserted before the extension of the unmapped BAM's name to name the output.
pub const OUTPUT_SUFFIX: &str = "_fixup";

/// How often (in mapped records) progress is logged.
const PROGRESS_UNIT: u64 = 1_000_000;

/// Options for a reconditioning run.
#[derive(Clone, Debug, Builder)]
#[builder(name = "Builder", build_fn(name = "build_options"))]
pub struct Options {
    /// The directory containing the mapped and unmapped BAMs.
    #[builder(setter(into))]
    input_dir: PathBuf,
    /// The directory to write the output BAM to; the input directory if unset.
    #[builder(setter(into, strip_option), default)]
    output_dir: Option<PathBuf>,
    #[builder(setter(into), default = "MAPPED_FILE_NAME.to_string()")]
    mapped_file_name: String,
    #[builder(setter(into), default = "UNMAPPED_FILE_NAME.to_string()")]
    unmapped_file_name: String,
    #[builder(setter(into), default = "OUTPUT_SUFFIX.to_string()")]
    output_suffix: String,
    #[builder(setter(into), default = "TOOL_NAME.to_string()")]
    program_id: String,
    #[builder(setter(into), default = "VERSION.clone()")]
    version: String,
    /// The command line recorded in the output header.
    #[builder(setter(into), default)]
    command_line: String,
    /// Stops the run when raised.
    #[builder(default)]
    interrupt: InterruptFlag,
}

impl Options {
    pub fn mapped_path(&self) -> PathBuf {
        self.input_dir.join(&self.mapped_file_name)
    }

    pub fn unmapped_path(&self) -> PathBuf {
        self.input_dir.join(&self.unmapped_file_name)
    }

    pub fn output_dir(&self) -> &PathBuf {
        self.output_dir.as_ref().unwrap_or(&self.input_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir().join(with_suffix_before_extension(
            &self.unmapped_file_name,
            &self.output_suffix,
        ))
    }

    fn program_info(&self) -> ProgramInfo {
        ProgramInfo {
            id: self.program_id.clone(),
            name: TOOL_NAME.to_string(),
            version: self.version.clone(),
            command_line: self.command_line.clone(),
        }
    }
}

/// Logs the programs recorded in the mapped BAM's header, i.e. the aligner that produced it.
fn log_upstream_programs(header: &Header) {
    for (id, program) in header.programs().as_ref() {
        let version = program
            .other_fields()
            .get(&tag::VERSION)
            .map_or_else(|| "(unknown version)".to_string(), ToString::to_string);
        info!("Mapped reads were processed by {id} {version}");
    }
}

/// Passes `records` through, failing once `interrupt` is raised.  `on_record` is called for each
/// record read successfully.
fn checked_records<'a, I, F>(
    records: I,
    interrupt: &'a InterruptFlag,
    mut on_record: F,
) -> impl Iterator<Item = Result<RecordBuf, ReconditionError>> + 'a
where
    I: Iterator<Item = Result<RecordBuf, ReconditionError>> + 'a,
    F: FnMut() + 'a,
{
    records.map(move |result| -> Result<RecordBuf, ReconditionError> {
        interrupt.check()?;
        let record = result?;
        on_record();
        Ok(record)
    })
}

/// Reconditions the unmapped BAM of a TopHat run and writes the corrected copy.
///
/// The unmapped BAM is loaded into memory; the mapped BAM is streamed once.  The output has the
/// unmapped BAM's header, with this tool appended to its program chain, and exactly the unmapped
/// records in their original order.
pub fn run(opts: &Options) -> Result<FixupSummary> {
    let unmapped_path = opts.unmapped_path();
    info!("Opening unmapped BAM file: {}", unmapped_path.display());
    let mut unmapped_bam = open_bam(Role::Unmapped, &unmapped_path)?;
    info!("Loading unmapped BAM file into memory: {}", unmapped_path.display());
    let unmapped_records = checked_records(unmapped_bam.records(), &opts.interrupt, || ())
        .collect::<Result<Vec<_>, _>>()?;
    let unmapped_header = unmapped_bam.into_header();
    let unmapped_references = ReferenceTable::from_header(&unmapped_header);

    let mapped_path = opts.mapped_path();
    info!("Opening mapped BAM file: {}", mapped_path.display());
    let mut mapped_bam = open_bam(Role::Mapped, &mapped_path)?;
    log_upstream_programs(mapped_bam.header());
    let mapped_references = ReferenceTable::from_header(mapped_bam.header());

    let progress_logger = ProgLogBuilder::new()
        .name("recondition-progress")
        .noun("mapped reads")
        .verb("Processed")
        .unit(PROGRESS_UNIT)
        .count_formatter(CountFormatterKind::Comma)
        .build();
    let (reads, summary) = recondition(
        unmapped_records,
        checked_records(mapped_bam.records(), &opts.interrupt, || {
            progress_logger.record();
        }),
        &mapped_references,
        &unmapped_references,
    )?;
    drop(mapped_bam);

    let header = append_program(unmapped_header, &opts.program_info())?;
    let output_path = opts.output_path();
    info!("Writing corrected BAM file: {}", output_path.display());
    write_bam(&output_path, &header, reads.iter(), &opts.interrupt)?;

    summary.log();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use bstr::BString;
    use noodles::{
        core::Position,
        sam::{
            alignment::{
                record::{data::field::Tag, Flags, MappingQuality},
                record_buf::{data::field::Value, QualityScores, Sequence},
                RecordBuf,
            },
            header::record::value::{
                map::{program::tag, Program, ReferenceSequence},
                Map,
            },
            Header,
        },
    };
    use rstest::rstest;
    use std::{
        io,
        num::NonZeroUsize,
        path::{Path, PathBuf},
    };
    use tempfile::TempDir;

    use super::{checked_records, run, Builder, Options};
    use crate::{
        errors::{ReconditionError, Role},
        interrupt::InterruptFlag,
        io::{open_bam, write_bam},
        record::read_name,
    };

    fn header(references: &[&str], programs: &[&str]) -> Header {
        let length = NonZeroUsize::try_from(10_000).unwrap();
        let mut builder = Header::builder();
        for name in references {
            builder = builder.add_reference_sequence(*name, Map::<ReferenceSequence>::new(length));
        }
        for id in programs {
            let program = Map::<Program>::builder()
                .insert(tag::VERSION, "2.0.8")
                .build()
                .unwrap();
            builder = builder.add_program(*id, program);
        }
        builder.build()
    }

    fn unmapped(name: &str, flags: Flags) -> RecordBuf {
        let mut record = RecordBuf::default();
        *record.name_mut() = Some(BString::from(name));
        *record.flags_mut() = Flags::UNMAPPED | flags;
        *record.mapping_quality_mut() = MappingQuality::new(255);
        record
    }

    fn mapped(name: &str, flags: Flags, reference_id: usize, start: usize) -> RecordBuf {
        let mut record = RecordBuf::default();
        *record.name_mut() = Some(BString::from(name));
        *record.flags_mut() = flags;
        *record.reference_sequence_id_mut() = Some(reference_id);
        *record.alignment_start_mut() = Position::new(start);
        *record.mapping_quality_mut() = MappingQuality::new(50);
        record
    }

    fn write_inputs(dir: &Path, unmapped_records: &[RecordBuf], mapped_records: &[RecordBuf]) {
        let mapped_header = header(&["chr1", "chr2", "chr3"], &["TopHat"]);
        let unmapped_header = header(&["chrM", "chr1", "chrX", "chrY", "chr2", "chr3"], &["TopHat"]);
        let interrupt = InterruptFlag::new();
        write_bam(&dir.join("unmapped.bam"), &unmapped_header, unmapped_records, &interrupt)
            .unwrap();
        write_bam(&dir.join("accepted_hits.bam"), &mapped_header, mapped_records, &interrupt)
            .unwrap();
    }

    fn read_output(path: &Path) -> (Header, Vec<RecordBuf>) {
        let mut output = open_bam(Role::Unmapped, path).unwrap();
        let records = output.records().map(Result::unwrap).collect();
        (output.into_header(), records)
    }

    fn options(input_dir: &Path) -> Options {
        Builder::default()
            .input_dir(input_dir)
            .version("1.2.3")
            .command_line("recondition in out")
            .build_options()
            .unwrap()
    }

    #[rstest]
    fn test_options_paths() {
        let opts = Builder::default()
            .input_dir("/data/tophat")
            .build_options()
            .unwrap();
        assert_eq!(opts.mapped_path(), Path::new("/data/tophat/accepted_hits.bam"));
        assert_eq!(opts.unmapped_path(), Path::new("/data/tophat/unmapped.bam"));
        assert_eq!(opts.output_path(), Path::new("/data/tophat/unmapped_fixup.bam"));

        let opts = Builder::default()
            .input_dir("/data/tophat")
            .output_dir("/results")
            .build_options()
            .unwrap();
        assert_eq!(opts.output_path(), Path::new("/results/unmapped_fixup.bam"));
    }

    #[rstest]
    fn test_run_mapped_mate_found() {
        let dir = TempDir::new().unwrap();
        write_inputs(
            dir.path(),
            &[unmapped("A/1", Flags::SEGMENTED | Flags::FIRST_SEGMENT)],
            &[mapped(
                "A",
                Flags::SEGMENTED | Flags::LAST_SEGMENT | Flags::MATE_UNMAPPED,
                2,
                500,
            )],
        );

        let opts = options(dir.path());
        let summary = run(&opts).unwrap();
        assert_eq!(summary.unmapped_records, 1);
        assert_eq!(summary.reconcile.mapped_records, 1);
        assert_eq!(summary.reconcile.mates_standardized, 1);
        assert_eq!(summary.orphans_unpaired, 0);

        let (header, records) = read_output(&opts.output_path());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(read_name(record), "A");
        assert_eq!(record.reference_sequence_id(), Some(5));
        assert_eq!(record.mate_reference_sequence_id(), Some(5));
        assert_eq!(record.alignment_start(), Position::new(500));
        assert_eq!(record.mate_alignment_start(), Some(Position::MIN));
        assert_eq!(record.mapping_quality(), MappingQuality::new(0));
        assert!(record.flags().is_segmented());

        // the unmapped header, plus this tool at the end of the program chain
        assert_eq!(header.reference_sequences().len(), 6);
        let programs = header.programs();
        let ids: Vec<_> = programs.as_ref().keys().map(ToString::to_string).collect();
        assert_eq!(ids, vec!["TopHat", "recondition"]);
        let pg = programs.as_ref().get(b"recondition".as_slice()).unwrap();
        let field = |t| pg.other_fields().get(&t).map(ToString::to_string);
        assert_eq!(field(tag::VERSION), Some("1.2.3".to_string()));
        assert_eq!(field(tag::COMMAND_LINE), Some("recondition in out".to_string()));
        assert_eq!(field(tag::PREVIOUS_PROGRAM_ID), Some("TopHat".to_string()));
    }

    #[rstest]
    fn test_run_orphan_with_separate_output_dir() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_inputs(
            input.path(),
            &[unmapped("B/2", Flags::SEGMENTED | Flags::LAST_SEGMENT)],
            &[],
        );

        let opts = Builder::default()
            .input_dir(input.path())
            .output_dir(output.path())
            .build_options()
            .unwrap();
        let summary = run(&opts).unwrap();
        assert_eq!(summary.orphans_unpaired, 1);
        assert!(!input.path().join("unmapped_fixup.bam").exists());

        let (_, records) = read_output(&output.path().join("unmapped_fixup.bam"));
        assert_eq!(records.len(), 1);
        assert_eq!(read_name(&records[0]), "B");
        assert_eq!(records[0].flags(), Flags::UNMAPPED);
    }

    #[rstest]
    fn test_run_missing_mapped_bam_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_bam(
            &dir.path().join("unmapped.bam"),
            &header(&["chr1"], &[]),
            &[unmapped("C", Flags::empty())],
            &InterruptFlag::new(),
        )
        .unwrap();

        let opts = options(dir.path());
        let err = run(&opts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReconditionError>(),
            Some(ReconditionError::InputAccess { role: Role::Mapped, .. })
        ));
        assert!(!opts.output_path().exists());
    }

    #[rstest]
    fn test_checked_records_counts_only_records_read() {
        let bad_record = || ReconditionError::InputRecord {
            role: Role::Mapped,
            path: PathBuf::from("accepted_hits.bam"),
            source: io::Error::from(io::ErrorKind::InvalidData),
        };
        let records = vec![Ok(RecordBuf::default()), Err(bad_record()), Ok(RecordBuf::default())];
        let interrupt = InterruptFlag::new();
        let mut count = 0;
        let results: Vec<_> =
            checked_records(records.into_iter(), &interrupt, || count += 1).collect();

        assert_eq!(results.len(), 3);
        assert!(matches!(results[1], Err(ReconditionError::InputRecord { .. })));
        assert_eq!(count, 2);
    }

    #[rstest]
    fn test_checked_records_stops_when_interrupted() {
        let records = vec![Ok(RecordBuf::default()), Ok(RecordBuf::default())];
        let interrupt = InterruptFlag::new();
        let mut checked = checked_records(records.into_iter(), &interrupt, || ());

        assert!(checked.next().unwrap().is_ok());
        interrupt.raise();
        assert!(matches!(checked.next(), Some(Err(ReconditionError::Interrupted))));
    }

    #[rstest]
    fn test_run_interrupted_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_inputs(
            dir.path(),
            &[unmapped("A/1", Flags::SEGMENTED | Flags::FIRST_SEGMENT)],
            &[mapped("A", Flags::SEGMENTED | Flags::MATE_UNMAPPED, 0, 10)],
        );

        let interrupt = InterruptFlag::new();
        let opts = Builder::default()
            .input_dir(dir.path())
            .interrupt(interrupt.clone())
            .build_options()
            .unwrap();
        interrupt.raise();

        let err = run(&opts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReconditionError>(),
            Some(ReconditionError::Interrupted)
        ));
        let mut entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["accepted_hits.bam", "unmapped.bam"]);
    }

    #[rstest]
    fn test_run_keeps_sequence_qualities_and_tags() {
        let dir = TempDir::new().unwrap();
        let mut record = unmapped("D/1", Flags::SEGMENTED | Flags::FIRST_SEGMENT);
        *record.sequence_mut() = Sequence::from(b"ACGT".to_vec());
        *record.quality_scores_mut() = QualityScores::from(vec![30, 31, 32, 33]);
        record.data_mut().insert(Tag::new(b'X', b'Y'), Value::from("hi"));
        write_inputs(dir.path(), &[record.clone()], &[]);

        let opts = options(dir.path());
        run(&opts).unwrap();

        let (_, records) = read_output(&opts.output_path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence(), record.sequence());
        assert_eq!(records[0].quality_scores(), record.quality_scores());
        assert_eq!(records[0].data(), record.data());
    }
}
