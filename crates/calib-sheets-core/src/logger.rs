//! Stderr logging for the CLI and examples.
//!
//! Lines look like `[  0.012s  INFO] wrote ...`. At `debug` and `trace` the
//! record target is added so the emitting crate is visible:
//! `[  0.012s DEBUG calib_sheets_charuco::render] board zone ...`.
//!
//! With the `tracing` feature, [`init_tracing`] installs a `tracing`
//! subscriber instead. `log` records reach it through the subscriber's
//! `tracing-log` bridge.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    fn shows_target(&self) -> bool {
        self.level >= LevelFilter::Debug
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let target = self.shows_target().then(|| record.target());
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            target,
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn format_line(elapsed: f64, level: Level, target: Option<&str>, msg: &fmt::Arguments) -> String {
    match target {
        Some(target) => format!("[{elapsed:7.3}s {level:>5} {target}] {msg}"),
        None => format!("[{elapsed:7.3}s {level:>5}] {msg}"),
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with the provided level filter.
///
/// Only the first call installs anything; later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// `EnvFilter` directive equivalent to a `log` level filter.
#[cfg(feature = "tracing")]
fn level_directive(level: LevelFilter) -> String {
    level.as_str().to_ascii_lowercase()
}

/// Install a `tracing` subscriber filtered at `level`.
///
/// A `RUST_LOG` filter, when set and valid, replaces `level`. Span close
/// events carry the timings of the `instrument`ed render and detect calls.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_noop() {
        init_with_level(LevelFilter::Warn).expect("first init");
        init_with_level(LevelFilter::Trace).expect("second init");
        assert_eq!(log::max_level(), LevelFilter::Warn);
    }

    #[test]
    fn target_only_at_debug_and_below() {
        let plain = format_line(1.5, Level::Info, None, &format_args!("wrote {}", "a.png"));
        assert_eq!(plain, "[  1.500s  INFO] wrote a.png");

        let detailed = format_line(0.0, Level::Debug, Some("calib_sheets_charuco"), &format_args!("zone"));
        assert_eq!(detailed, "[  0.000s DEBUG calib_sheets_charuco] zone");
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn cli_level_maps_to_filter_directive() {
        assert_eq!(level_directive(LevelFilter::Warn), "warn");
        assert_eq!(level_directive(LevelFilter::Trace), "trace");
        assert_eq!(level_directive(LevelFilter::Off), "off");
        assert!(EnvFilter::try_new(level_directive(LevelFilter::Debug)).is_ok());
    }
}
