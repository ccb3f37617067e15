//! Minimal stderr logger for the `log` facade.
//!
//! Level comes from `-v` (repeatable) or `SGRID_LOG`; `-v` wins.

use log::{LevelFilter, Metadata, Record};

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

pub fn init(verbose: u8) {
    static LOGGER: StderrLogger = StderrLogger;
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level(verbose, std::env::var("SGRID_LOG").ok().as_deref()));
}

fn level(verbose: u8, env: Option<&str>) -> LevelFilter {
    match verbose {
        0 => {}
        1 => return LevelFilter::Info,
        2 => return LevelFilter::Debug,
        _ => return LevelFilter::Trace,
    }
    match env {
        Some("error") => LevelFilter::Error,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        Some("off") => LevelFilter::Off,
        _ => LevelFilter::Warn,
    }
}
