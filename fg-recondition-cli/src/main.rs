pub mod commands;
pub mod logging;

use anyhow::Error;
use clap::Parser;
use commands::{
    command::Command,
    recondition::{CliError, Recondition},
};
use itertools::Itertools;
use log::{error, info, warn};
use recondition::{errors::ReconditionError, interrupt::InterruptFlag};
use std::{env, io, process::exit};

/// Maps a failed run to the process exit status.
///
/// Usage problems exit with `EINVAL` and an interrupted run with `EINTR`.  Failures caused by an
/// operating system error exit with that error's code, anything else with 1.
fn exit_code(err: &Error) -> i32 {
    if is_interrupted(err) {
        return libc::EINTR;
    }
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::NotADirectory { .. } => libc::EINVAL,
            CliError::LogFile { .. } => 1,
        };
    }
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .find_map(io::Error::raw_os_error)
        .unwrap_or(1)
}

/// True if the run stopped because the user interrupted it.
fn is_interrupted(err: &Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ReconditionError>(),
            Some(ReconditionError::Interrupted)
        )
    })
}

fn main() {
    let command_line = env::args_os().map(|arg| arg.to_string_lossy().into_owned()).join(" ");

    let args = match Recondition::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Help and version requests are reported as "errors" by clap, but go to stdout.
            let code = if err.use_stderr() { libc::EINVAL } else { 0 };
            let _ = err.print();
            exit(code);
        }
    };

    let log_sink = logging::init(args.quiet, args.debug);

    let interrupt = InterruptFlag::new();
    let handler_flag = interrupt.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_flag.raise()) {
        warn!("Cannot install the interrupt handler: {err}");
    }

    if let Err(err) = args.execute(&command_line, &log_sink, &interrupt) {
        if is_interrupted(&err) {
            info!("Program interrupted by user, exiting.");
        } else if args.debug {
            error!("{:?}", err);
        } else {
            error!("{:#}", err);
        }
        exit(exit_code(&err));
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Error};
    use std::{io, path::PathBuf};

    use recondition::errors::ReconditionError;

    use super::{exit_code, is_interrupted};
    use crate::commands::recondition::CliError;

    #[test]
    fn test_exit_code_for_usage_errors() {
        let err = Error::new(CliError::NotADirectory {
            what: "result_dir",
            path: PathBuf::from("x"),
        });
        assert_eq!(exit_code(&err), libc::EINVAL);

        let err = Error::new(CliError::LogFile {
            path: PathBuf::from("x"),
            source: io::Error::from_raw_os_error(libc::EACCES),
        });
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_exit_code_for_io_errors() {
        let err = Error::new(io::Error::from_raw_os_error(libc::ENOENT)).context("Cannot open");
        assert_eq!(exit_code(&err), libc::ENOENT);

        // a transient interrupted system call is not the user stopping the run
        let err = Error::new(io::Error::from(io::ErrorKind::Interrupted)).context("Reading");
        assert_eq!(exit_code(&err), 1);
        assert!(!is_interrupted(&err));

        let err = Error::new(io::Error::new(io::ErrorKind::InvalidData, "truncated"));
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_exit_code_for_user_interruption() {
        let err = Error::new(ReconditionError::Interrupted).context("Reconditioning failed");
        assert!(is_interrupted(&err));
        assert_eq!(exit_code(&err), libc::EINTR);
    }

    #[test]
    fn test_exit_code_for_other_errors() {
        assert_eq!(exit_code(&anyhow!("something else")), 1);
    }
}
