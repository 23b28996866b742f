use crate::logging::LoggingSettings;
use clap::Parser;
use humantime_serde::re::humantime;
use std::{path::PathBuf, time::Duration};

#[derive(Parser, Debug)]
#[clap(
    name = "plexsweep",
    version,
    about = "Deletes empty Plex collections and playlists, once or on an interval."
)]
pub struct Cli {
    /// Run a single cleanup cycle and exit instead of looping
    #[clap(long)]
    pub once: bool,
    /// Only report empty collections and playlists, do not delete anything
    #[clap(long)]
    pub dry_run: bool,
    /// Path to the YAML config file
    #[clap(short, long, default_value = "config/config.yaml", env = "CONFIG_PATH")]
    pub config: PathBuf,
    /// Set the log level, e.g. `info` or `warn,plexsweep=debug`
    #[clap(short, long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: LoggingSettings,
    /// How long to wait before checking the config file again while it is
    /// missing, malformed or still holds the placeholder token
    #[clap(
        long,
        default_value = "30s",
        env = "CONFIG_RETRY_DELAY",
        value_parser = humantime::parse_duration
    )]
    pub retry_delay: Duration,
}
