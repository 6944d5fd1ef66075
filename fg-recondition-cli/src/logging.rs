use env_logger::{Env, Target};
use std::{
    fs::File,
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

struct SinkState {
    console: bool,
    /// Log output written before a log file was attached.
    pending: Vec<u8>,
    file: Option<File>,
}

/// Destination of the log output: the console (unless quiet) and a log file.
///
/// The log file location is only known once the command line has been validated, so output is
/// held in memory until [`LogSink::attach_file`] is called, then replayed into the file.
#[derive(Clone)]
pub struct LogSink {
    state: Arc<Mutex<SinkState>>,
}

impl LogSink {
    pub fn new(console: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState { console, pending: Vec::new(), file: None })),
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, SinkState>> {
        self.state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log sink lock poisoned"))
    }

    /// Creates (or truncates) the log file at `path`, writing it everything logged so far.
    pub fn attach_file(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        let mut state = self.lock()?;
        file.write_all(&state.pending)?;
        file.flush()?;
        state.pending = Vec::new();
        state.file = Some(file);
        Ok(())
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if state.console {
            io::stderr().write_all(buf)?;
        }
        match state.file.as_mut() {
            Some(file) => file.write_all(buf)?,
            None => state.pending.extend_from_slice(buf),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.lock()?;
        if let Some(file) = state.file.as_mut() {
            file.flush()?;
        }
        io::stderr().flush()
    }
}

/// Installs the global logger, writing `<timestamp> - <message>` lines to the returned sink.
///
/// The level defaults to `info` (`debug` in debug mode) and can be overridden with `RUST_LOG`.
pub fn init(quiet: bool, debug: bool) -> LogSink {
    let sink = LogSink::new(!quiet);
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "{} - {}", buf.timestamp_seconds(), record.args()))
        .target(Target::Pipe(Box::new(sink.clone())))
        .init();
    sink
}
