use crate::sleeper::Sleeper;
use humantime_serde::re::humantime::format_duration;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_yaml::Value;
use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

/// Token value shipped in the sample config, treated as "not configured yet"
pub const PLACEHOLDER_TOKEN: &str = "your-plex-token";

/// Library categories that are swept, in this order. Any other category in
/// `LIBRARIES` is accepted but ignored.
pub const LIBRARY_CATEGORIES: [&str; 2] = ["movies", "shows"];

const DEFAULT_INTERVAL_HOURS: f64 = 24.0;
const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// A validated configuration snapshot. A fresh one is loaded before every
/// cleanup cycle and never modified afterwards.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub token: String,
    pub libraries: BTreeMap<String, Vec<String>>,
    pub delete_collections: bool,
    pub delete_playlists: bool,
    pub interval_hours: f64,
    interval: Duration,
}

impl Config {
    /// Parse and validate the raw contents of a config file
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Err(ConfigError::Malformed("the file is empty".to_string()));
        }
        let raw: RawConfig =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))?;

        if let Some(Value::String(token)) = &raw.token
            && token.trim() == PLACEHOLDER_TOKEN
        {
            return Err(ConfigError::PlaceholderToken);
        }

        let base_url = required_string("PLEX_BASEURL", raw.base_url)?;
        let token = required_string("PLEX_TOKEN", raw.token)?;
        let libraries = raw
            .libraries
            .ok_or(ConfigError::MissingKey("LIBRARIES"))
            .and_then(parse_libraries)?;
        let delete_collections = optional_bool("DELETE_COLLECTIONS", raw.delete_collections)?;
        let delete_playlists = optional_bool("DELETE_PLAYLISTS", raw.delete_playlists)?;
        let (interval_hours, interval) = match raw.interval_hours {
            Some(value) => parse_interval_hours(value)?,
            None => (DEFAULT_INTERVAL_HOURS, DEFAULT_INTERVAL),
        };

        Ok(Self {
            base_url,
            token,
            libraries,
            delete_collections,
            delete_playlists,
            interval_hours,
            interval,
        })
    }

    /// The pause between two cleanup cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Names of the library sections to sweep, `movies` first, then `shows`
    pub fn library_names(&self) -> impl Iterator<Item = &str> {
        LIBRARY_CATEGORIES
            .iter()
            .filter_map(|category| self.libraries.get(*category))
            .flatten()
            .map(String::as_str)
    }

    fn unknown_categories(&self) -> impl Iterator<Item = &str> {
        self.libraries
            .keys()
            .map(String::as_str)
            .filter(|category| !LIBRARY_CATEGORIES.contains(category))
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("libraries", &self.libraries)
            .field("delete_collections", &self.delete_collections)
            .field("delete_playlists", &self.delete_playlists)
            .field("interval_hours", &self.interval_hours)
            .finish()
    }
}

/// Config file as written by the operator. Every field is kept untyped so
/// that a wrong type is reported against its key rather than as a generic
/// parse failure.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "PLEX_BASEURL")]
    base_url: Option<Value>,
    #[serde(rename = "PLEX_TOKEN")]
    token: Option<Value>,
    #[serde(rename = "LIBRARIES")]
    libraries: Option<Value>,
    #[serde(rename = "DELETE_COLLECTIONS")]
    delete_collections: Option<Value>,
    #[serde(rename = "DELETE_PLAYLISTS")]
    delete_playlists: Option<Value>,
    #[serde(rename = "INTERVAL_HOURS")]
    interval_hours: Option<Value>,
}

fn required_string(key: &'static str, value: Option<Value>) -> Result<String, ConfigError> {
    match value {
        None => Err(ConfigError::MissingKey(key)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ConfigError::MissingKey(key)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(ConfigError::InvalidType {
            key,
            expected: "a string",
        }),
    }
}

fn optional_bool(key: &'static str, value: Option<Value>) -> Result<bool, ConfigError> {
    match value {
        None => Ok(true),
        Some(Value::Bool(b)) => Ok(b),
        Some(_) => Err(ConfigError::InvalidType {
            key,
            expected: "true or false",
        }),
    }
}

fn parse_libraries(value: Value) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
    let Value::Mapping(mapping) = value else {
        return Err(ConfigError::InvalidLibraries(
            "expected a mapping of categories to lists".to_string(),
        ));
    };

    let mut libraries = BTreeMap::new();
    for (category, names) in mapping {
        let category = match category {
            Value::String(category) => category,
            other => {
                return Err(ConfigError::InvalidLibraries(format!(
                    "category {other:?} is not a string"
                )));
            }
        };
        let Value::Sequence(names) = names else {
            return Err(ConfigError::InvalidLibraries(format!(
                "`{category}` is not a list of library names"
            )));
        };
        let names = names
            .into_iter()
            .map(|name| match name {
                Value::String(name) => Ok(name),
                other => Err(ConfigError::InvalidLibraries(format!(
                    "`{category}` contains {other:?}, expected a library name"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        libraries.insert(category, names);
    }
    Ok(libraries)
}

/// The interval must be a positive number of hours that fits into a
/// [`Duration`]
fn parse_interval_hours(value: Value) -> Result<(f64, Duration), ConfigError> {
    let hours = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let interval = hours
        .filter(|hours| hours.is_finite() && *hours > 0.0)
        .and_then(|hours| {
            let interval = Duration::try_from_secs_f64(hours * 3600.0).ok()?;
            Some((hours, interval))
        });
    match interval {
        Some(interval) => Ok(interval),
        None => Err(ConfigError::InvalidInterval(
            serde_yaml::to_string(&value)
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|_| format!("{value:?}")),
        )),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found, create it with PLEX_BASEURL, PLEX_TOKEN and LIBRARIES")]
    NotFound,
    #[error("config file can not be read: {0}")]
    Unreadable(#[source] std::io::Error),
    #[error("config file is not valid YAML: {0}")]
    Malformed(String),
    #[error("PLEX_TOKEN is still set to `your-plex-token`, put your Plex token there")]
    PlaceholderToken,
    #[error("required key {0} is missing from the config file")]
    MissingKey(&'static str),
    #[error("{key} must be {expected}")]
    InvalidType {
        key: &'static str,
        expected: &'static str,
    },
    #[error("LIBRARIES is invalid: {0}")]
    InvalidLibraries(String),
    #[error("INTERVAL_HOURS must be a positive number, got `{0}`")]
    InvalidInterval(String),
}

impl ConfigError {
    /// Whether the operator is expected to fix the file shortly, in which
    /// case loading waits and tries again instead of giving up
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Unreadable(_) | Self::Malformed(_) | Self::PlaceholderToken
        )
    }
}

enum LoadState {
    Searching,
    Validating(String),
    Ready(Config),
}

/// Reads the config file, waiting for it to become usable
pub struct ConfigLoader<S> {
    path: PathBuf,
    retry_delay: Duration,
    sleeper: S,
}

impl<S: Sleeper> ConfigLoader<S> {
    pub fn new(path: impl Into<PathBuf>, retry_delay: Duration, sleeper: S) -> Self {
        Self {
            path: path.into(),
            retry_delay,
            sleeper,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a validated config. Blocks for as long as the file is missing,
    /// malformed or holds the placeholder token. Returns an error only for
    /// validation failures that need operator attention.
    pub async fn load(&self) -> Result<Config, ConfigError> {
        self.ensure_parent_dir().await;

        let mut state = LoadState::Searching;
        loop {
            state = match state {
                LoadState::Searching => match self.read().await {
                    Ok(raw) => LoadState::Validating(raw),
                    Err(e) => self.retry(e).await?,
                },
                LoadState::Validating(raw) => match Config::from_yaml(&raw) {
                    Ok(config) => LoadState::Ready(config),
                    Err(e) => self.retry(e).await?,
                },
                LoadState::Ready(config) => {
                    for category in config.unknown_categories() {
                        warn!("ignoring unknown LIBRARIES category `{category}`");
                    }
                    debug!("loaded config from {}: {config:?}", self.path.display());
                    return Ok(config);
                }
            };
        }
    }

    async fn read(&self) -> Result<String, ConfigError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ConfigError::NotFound,
                _ => ConfigError::Unreadable(e),
            })
    }

    async fn retry(&self, error: ConfigError) -> Result<LoadState, ConfigError> {
        if !error.is_retryable() {
            return Err(error);
        }
        warn!(
            "{}: {error}. Checking again in {}",
            self.path.display(),
            format_duration(self.retry_delay)
        );
        self.sleeper.sleep(self.retry_delay).await;
        Ok(LoadState::Searching)
    }

    async fn ensure_parent_dir(&self) {
        let Some(parent) = self.path.parent() else {
            return;
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return;
        }
        match tokio::fs::create_dir_all(parent).await {
            Ok(()) => info!("created config directory {}", parent.display()),
            Err(e) => warn!(
                "unable to create config directory {}: {e}",
                parent.display()
            ),
        }
    }
}
