//! Minimal logger with an error counter.
//!
//! The logger prints `[elapsed LEVEL] message` to stderr with a simple
//! elapsed-time prefix. Use `init_with_level` to install it once at startup.
//!
//! Every error-level record bumps a process-wide counter, so a front end can
//! run a board operation and then ask whether anything went wrong while it
//! ran (`reset_error_count` before, `error_count` after). The counter works
//! even when records are filtered out by the level, and even when another
//! logger is installed, as long as errors go through [`note_error`].

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

static ERRORS: AtomicUsize = AtomicUsize::new(0);
static INSTALLED: AtomicBool = AtomicBool::new(false);

struct SimpleLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if record.level() == Level::Error {
            ERRORS.fetch_add(1, Ordering::Relaxed);
        }
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5}] {}",
            elapsed,
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<SimpleLogger> = OnceLock::new();

/// Install the simple logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization. The global max level is kept at `Error` or above so the
/// error counter keeps working under `LevelFilter::Off`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| SimpleLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level.max(LevelFilter::Error));
        INSTALLED.store(true, Ordering::Relaxed);
    }
    Ok(())
}

/// Log an error and count it.
///
/// Board operations report failures through this helper so the counter is
/// accurate regardless of which `log` backend the application installed.
pub fn note_error(message: std::fmt::Arguments<'_>) {
    if !INSTALLED.load(Ordering::Relaxed) {
        ERRORS.fetch_add(1, Ordering::Relaxed);
    }
    log::error!("{}", message);
}

/// Number of error records seen since start-up or the last reset.
pub fn error_count() -> usize {
    ERRORS.load(Ordering::Relaxed)
}

/// Reset the error counter, returning the previous value.
pub fn reset_error_count() -> usize {
    ERRORS.swap(0, Ordering::Relaxed)
}

/// `EnvFilter` directive for a `log` level, e.g. `"debug"`.
#[cfg(any(feature = "tracing", test))]
fn default_directive(level: LevelFilter) -> String {
    level.as_str().to_ascii_lowercase()
}

#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    init_tracing_with_level(json, LevelFilter::Info);
}

/// Install a `tracing` subscriber. `RUST_LOG` wins over `default_level`.
#[cfg(feature = "tracing")]
pub fn init_tracing_with_level(json: bool, default_level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(default_level)));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_filter_directive() {
        assert_eq!(default_directive(LevelFilter::Debug), "debug");
        assert_eq!(default_directive(LevelFilter::Info), "info");
        assert_eq!(default_directive(LevelFilter::Off), "off");
    }

    #[test]
    fn note_error_bumps_counter_without_logger() {
        let before = error_count();
        note_error(format_args!("synthetic failure"));
        assert!(error_count() > before);
    }
}
