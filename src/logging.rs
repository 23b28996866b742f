use log::{Level, LevelFilter};
use std::str::FromStr;

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// setup logging for the application. Every record goes to stdout prefixed
/// with a timestamp and a human readable label (`Error`, `Warning`, ...).
/// Per-target levels are applied on top of the root level if provided.
pub fn setup_logging(settings: LoggingSettings) -> anyhow::Result<()> {
    let mut cfg = fern::Dispatch::new()
        .level(settings.root_level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{timestamp} [{label}] {message}",
                timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                label = level_label(record.level()),
                message = message,
            ))
        })
        .chain(std::io::stdout());

    for (log_target, level) in settings.other_levels {
        cfg = cfg.level_for(log_target, level);
    }
    cfg.apply()?;
    Ok(())
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "Error",
        Level::Warn => "Warning",
        Level::Info => "Info",
        Level::Debug => "Debug",
        Level::Trace => "Trace",
    }
}

#[derive(Debug, Clone)]
/// Root log level plus optional per-target overrides, so that the sweeper's
/// own output can be tuned separately from the HTTP stack.
///
/// Examples:
///   - `info`
///   - `off,plexsweep=debug,reqwest=info`
///   - `warn,plexsweep::cleaners=debug`
pub struct LoggingSettings {
    pub root_level: LevelFilter,
    pub other_levels: Vec<(String, LevelFilter)>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            root_level: DEFAULT_LEVEL,
            other_levels: Vec::new(),
        }
    }
}

impl FromStr for LoggingSettings {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let root_level = parts
            .next()
            .and_then(|level| LevelFilter::from_str(level).ok())
            .unwrap_or(DEFAULT_LEVEL);
        let other_levels = parts
            .filter_map(|s| {
                let (log_target, level) = s.split_once('=')?;
                let level = LevelFilter::from_str(level).unwrap_or(DEFAULT_LEVEL);
                Some((log_target.to_string(), level))
            })
            .collect();

        Ok(Self {
            root_level,
            other_levels,
        })
    }
}
