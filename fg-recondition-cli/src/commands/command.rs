use crate::logging::LogSink;
use anyhow::Result;
use recondition::interrupt::InterruptFlag;

pub trait Command {
    /// Runs the command.  `command_line` is the invocation as typed, recorded in outputs;
    /// `log_sink` receives the log file once its location is known; `interrupt` is raised when
    /// the user asks the run to stop.
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str, log_sink: &LogSink, interrupt: &InterruptFlag)
        -> Result<()>;
}
