//! Leveled stderr logging for the extension, thresholded by `RETRO_LOG`.
//!
//! Dropped games are reported at `error` so they show up with the default threshold; malformed
//! notation and skipped season files are `warn`; per-season totals are `info`.

use std::env;
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
}

impl Level {
    fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "warn" | "warning" => Self::Warn,
            "info" | "debug" => Self::Info,
            _ => Self::Error,
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
        }
    }
}

static RETRO_LOG: LazyLock<Level> = LazyLock::new(|| {
    env::var("RETRO_LOG")
        .map(|s| Level::from_str(&s))
        .unwrap_or(Level::Error)
});

fn emits(threshold: Level, level: Level) -> bool {
    level <= threshold
}

fn emit(level: Level, msg: &str) {
    if emits(*RETRO_LOG, level) {
        eprintln!("retrosheet {}: {}", level.tag(), msg);
    }
}

pub fn error(msg: impl AsRef<str>) {
    emit(Level::Error, msg.as_ref());
}

pub fn warn(msg: impl AsRef<str>) {
    emit(Level::Warn, msg.as_ref());
}

pub fn info(msg: impl AsRef<str>) {
    emit(Level::Info, msg.as_ref());
}
