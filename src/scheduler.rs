use crate::{
    cleaners::{CollectionsCleaner, PlaylistsCleaner, Skipped, SweepReport},
    config::{Config, ConfigLoader},
    services::Connect,
    sleeper::Sleeper,
};
use anyhow::Context;
use humantime_serde::re::humantime::format_duration;
use log::{debug, error, info};
use tokio::sync::watch;

/// Outcome of a single cleanup cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    pub connected: bool,
    /// `None` when the sweep was turned off or the server was unreachable
    pub collections: Option<SweepReport>,
    pub playlists: Option<SweepReport>,
}

impl CycleReport {
    fn summary(&self) -> String {
        if !self.connected {
            return "server unreachable".to_string();
        }
        format!(
            "collections: {}; playlists: {}",
            describe(&self.collections),
            describe(&self.playlists)
        )
    }

    fn skipped(&self) -> impl Iterator<Item = &Skipped> {
        [&self.collections, &self.playlists]
            .into_iter()
            .flatten()
            .flat_map(|report| report.skipped.iter())
    }
}

fn describe(report: &Option<SweepReport>) -> String {
    match report {
        None => "off".to_string(),
        Some(r) => format!(
            "{} empty, {} kept, {} skipped",
            r.deleted.len() + r.would_delete.len(),
            r.kept,
            r.skipped.len()
        ),
    }
}

/// Runs cleanup cycles, either once or on the interval from the config. A
/// fresh config is loaded and a new connection is opened for every cycle.
///
/// `shutdown` flips to `true` on Ctrl-C. It is only checked while waiting,
/// a sweep that already started always runs to the end.
pub struct Scheduler<C, S> {
    connector: C,
    loader: ConfigLoader<S>,
    sleeper: S,
    dry_run: bool,
}

impl<C, S> Scheduler<C, S>
where
    C: Connect,
    S: Sleeper,
{
    pub fn new(connector: C, loader: ConfigLoader<S>, sleeper: S, dry_run: bool) -> Self {
        Self {
            connector,
            loader,
            sleeper,
            dry_run,
        }
    }

    pub async fn run_once(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let Some(config) = self.load(&mut shutdown).await? else {
            info!("Interrupted before the cleanup started. Exiting.");
            return Ok(());
        };
        self.run_cycle(&config).await;
        info!("Cleanup complete. Exiting.");
        Ok(())
    }

    pub async fn run_forever(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let Some(mut config) = self.load(&mut shutdown).await? else {
            info!("Interrupted. Exiting.");
            return Ok(());
        };
        info!(
            "Interval mode enabled. Will run cleanup every {} hour(s).",
            config.interval_hours
        );

        while !*shutdown.borrow() {
            self.run_cycle(&config).await;

            let interval = config.interval();
            info!(
                "Cleanup complete. Waiting {} hour(s) ({}) for next run...",
                config.interval_hours,
                format_duration(interval)
            );
            tokio::select! {
                _ = self.sleeper.sleep(interval) => {}
                Ok(()) = shutdown.changed() => {}
            }

            match self.load(&mut shutdown).await? {
                Some(reloaded) => config = reloaded,
                None => break,
            }
        }

        info!("Interrupted. Exiting.");
        Ok(())
    }

    /// Connect and run the sweeps enabled in `config`. A connection failure
    /// only skips this cycle.
    pub async fn run_cycle(&self, config: &Config) -> CycleReport {
        let server = match self
            .connector
            .connect(&config.base_url, &config.token)
            .await
        {
            Ok(server) => server,
            Err(e) => {
                error!(
                    "unable to connect to Plex at {}, skipping this cycle: {e:#}",
                    config.base_url
                );
                return CycleReport::default();
            }
        };

        let mut report = CycleReport {
            connected: true,
            ..Default::default()
        };

        if config.delete_collections {
            let cleaner = CollectionsCleaner::new(&server, self.dry_run);
            report.collections = Some(cleaner.cleanup(config.library_names()).await);
        } else {
            info!("DELETE_COLLECTIONS is off, skipping collections");
        }

        if config.delete_playlists {
            let cleaner = PlaylistsCleaner::new(&server, self.dry_run);
            report.playlists = Some(cleaner.cleanup().await);
        } else {
            info!("DELETE_PLAYLISTS is off, skipping playlists");
        }

        info!("Cycle finished. {}", report.summary());
        for skipped in report.skipped() {
            debug!("skipped {}: {}", skipped.target, skipped.reason);
        }
        report
    }

    /// Wait for a usable config. `None` means Ctrl-C was pressed meanwhile.
    async fn load(&self, shutdown: &mut watch::Receiver<bool>) -> anyhow::Result<Option<Config>> {
        if *shutdown.borrow() {
            return Ok(None);
        }
        let path = self.loader.path().display();
        tokio::select! {
            config = self.loader.load() => {
                let config = config
                    .inspect_err(|e| error!("invalid config file {path}: {e}"))
                    .with_context(|| format!("invalid config file {path}"))?;
                Ok(Some(config))
            }
            Ok(()) = shutdown.changed() => Ok(None),
        }
    }
}
