/// Logger setup
///
/// The renderer owns the terminal. `--log-file` keeps records off the screen
/// entirely; otherwise they are held while the alternate screen is up and
/// written to stderr once it is left.
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, Once, OnceLock, PoisonError};

use crate::error::AppError;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "glscene_core=debug,glscene_terminal=info").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub log_file: Option<PathBuf>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            log_file: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Stderr that can be paused while the screen belongs to the renderer
#[derive(Debug, Clone, Default)]
pub struct StderrGate {
    state: Arc<Mutex<GateState>>,
}

#[derive(Debug, Default)]
struct GateState {
    holding: bool,
    held: Vec<u8>,
}

impl StderrGate {
    /// Keep everything written from now on until [`release`](Self::release).
    pub fn hold(&self) {
        self.lock().holding = true;
    }

    pub fn is_holding(&self) -> bool {
        self.lock().holding
    }

    /// Stop holding and write what was held to `out`.
    pub fn release_into<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let held = {
            let mut state = self.lock();
            state.holding = false;
            std::mem::take(&mut state.held)
        };
        out.write_all(&held)?;
        out.flush()
    }

    pub fn release(&self) -> io::Result<()> {
        self.release_into(&mut io::stderr())
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // A panic mid-write leaves plain bytes behind; keep using them.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for StderrGate {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        if state.holding {
            state.held.extend_from_slice(buf);
            Ok(buf.len())
        } else {
            drop(state);
            io::stderr().write(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.is_holding() {
            Ok(())
        } else {
            io::stderr().flush()
        }
    }
}

static STDERR_GATE: OnceLock<StderrGate> = OnceLock::new();

/// The gate the global logger writes through when no log file is set.
pub fn stderr_gate() -> &'static StderrGate {
    STDERR_GATE.get_or_init(StderrGate::default)
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) -> Result<(), AppError> {
    let file = match &config.log_file {
        Some(path) => Some(File::create(path).map_err(|source| AppError::LogFile {
            path: path.clone(),
            source,
        })?),
        None => None,
    };

    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }

        match file {
            Some(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
                builder.write_style(env_logger::WriteStyle::Never);
            }
            None => {
                builder.target(env_logger::Target::Pipe(Box::new(stderr_gate().clone())));
                builder.write_style(config.write_style);
            }
        }

        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_holds_until_released() {
        let mut gate = StderrGate::default();
        gate.hold();
        writeln!(gate, "frame 3 aborted").unwrap();
        gate.flush().unwrap();
        assert!(gate.is_holding());

        let mut out = Vec::new();
        gate.release_into(&mut out).unwrap();
        assert_eq!(out, b"frame 3 aborted\n");
        assert!(!gate.is_holding());
    }

    #[test]
    fn test_release_drains_held_output() {
        let mut gate = StderrGate::default();
        gate.hold();
        gate.write_all(b"once").unwrap();

        let mut first = Vec::new();
        gate.release_into(&mut first).unwrap();
        let mut second = Vec::new();
        gate.release_into(&mut second).unwrap();
        assert_eq!(first, b"once");
        assert!(second.is_empty());
    }

    #[test]
    fn test_clones_share_the_buffer() {
        let gate = StderrGate::default();
        let mut writer = gate.clone();
        gate.hold();
        writer.write_all(b"held").unwrap();

        let mut out = Vec::new();
        gate.release_into(&mut out).unwrap();
        assert_eq!(out, b"held");
    }
}
