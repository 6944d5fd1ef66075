use super::command::Command;
use crate::logging::LogSink;
use anyhow::Result;
use clap::{ArgAction, Parser};
use log::info;
use recondition::{
    interrupt::InterruptFlag,
    run::{run, Builder, MAPPED_FILE_NAME, TOOL_NAME, UNMAPPED_FILE_NAME},
    util::version::built_info,
};
use std::{env, io, path::PathBuf};
use thiserror::Error;

/// The log file written to the result directory unless `--log-file` is given.
pub const DEFAULT_LOG_NAME: &str = "recondition.log";

/// Problems with the command line that are detected after parsing.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Specified {what} does not exist or is not a directory: {}", .path.display())]
    NotADirectory { what: &'static str, path: PathBuf },

    #[error("Cannot open log file {}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reconditions the unmapped reads of a TopHat run so that downstream tools (e.g. Picard,
/// samtools or GATK) accept them.
///
/// TopHat writes its unmapped reads to `unmapped.bam`, next to the mapped reads in
/// `accepted_hits.bam`.  The unmapped reads have several defects that stricter tools reject:
///
/// - read names keep their `/1` and `/2` suffixes, so mates do not share a name;
/// - the mapping quality is not zero;
/// - pairs where both reads are unmapped lack the "mate unmapped" (0x8) flag;
/// - unmapped reads whose mate is mapped do not carry the mate's reference and position;
/// - unmapped reads may claim a mapped mate that is absent from `accepted_hits.bam`.
///
/// All of these are fixed (reads claiming an absent mate are made unpaired) and the result is
/// written to `unmapped_fixup.bam` in the result directory, with the records in their original
/// order.
#[derive(Parser, Debug, Clone)]
#[clap(
    name = TOOL_NAME,
    version = built_info::VERSION.as_str(),
    disable_version_flag = true,
    term_width = 0
)]
pub struct Recondition {
    /// The TopHat output directory, containing `accepted_hits.bam` and `unmapped.bam`.
    #[clap(value_name = "BAM_DIR", display_order = 1)]
    bam_dir: PathBuf,

    /// The directory to write `unmapped_fixup.bam` to [default: BAM_DIR].
    #[clap(value_name = "RESULT_DIR", display_order = 2)]
    result_dir: Option<PathBuf>,

    /// The log file [default: RESULT_DIR/recondition.log].
    #[clap(long, short = 'l', value_name = "FILE", display_order = 3)]
    log_file: Option<PathBuf>,

    /// Quiet mode, no console output.
    #[clap(long, short = 'q', default_value = "false", display_order = 4)]
    pub quiet: bool,

    /// Log each corrected read, and full details of any error.
    #[clap(long, short = 'd', default_value = "false", display_order = 5)]
    pub debug: bool,

    /// Print the version and exit.
    #[clap(long, short = 'v', action = ArgAction::Version, display_order = 6)]
    version: Option<bool>,
}

impl Recondition {
    fn result_dir(&self) -> &PathBuf {
        self.result_dir.as_ref().unwrap_or(&self.bam_dir)
    }

    fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.result_dir().join(DEFAULT_LOG_NAME))
    }

    fn validate(&self) -> Result<(), CliError> {
        if !self.bam_dir.is_dir() {
            return Err(CliError::NotADirectory {
                what: "bam_dir",
                path: self.bam_dir.clone(),
            });
        }
        if !self.result_dir().is_dir() {
            return Err(CliError::NotADirectory {
                what: "result_dir",
                path: self.result_dir().clone(),
            });
        }
        Ok(())
    }
}

impl Command for Recondition {
    fn execute(
        &self,
        command_line: &str,
        log_sink: &LogSink,
        interrupt: &InterruptFlag,
    ) -> Result<()> {
        info!("Starting run of {} {}", TOOL_NAME, built_info::VERSION.as_str());
        info!("Command: {command_line}");
        if let Ok(cwd) = env::current_dir() {
            info!("Current working directory: {}", cwd.display());
        }

        self.validate()?;

        let log_file = self.log_file();
        log_sink
            .attach_file(&log_file)
            .map_err(|source| CliError::LogFile {
                path: log_file.clone(),
                source,
            })?;
        info!("Writing logfile: {}", log_file.display());
        info!(
            "Reading {} and {} from {}",
            MAPPED_FILE_NAME,
            UNMAPPED_FILE_NAME,
            self.bam_dir.display()
        );

        let opts = Builder::default()
            .input_dir(self.bam_dir.clone())
            .output_dir(self.result_dir().clone())
            .command_line(command_line)
            .interrupt(interrupt.clone())
            .build_options()?;
        run(&opts)?;

        info!("Program finished successfully.");
        Ok(())
    }
}
