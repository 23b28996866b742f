use super::{Kind, SweepReport, remove_if_empty};
use crate::services::MediaServer;
use log::{debug, warn};

/// PlaylistsCleaner deletes server-wide playlists without any items.
pub struct PlaylistsCleaner<'a, S: ?Sized> {
    server: &'a S,
    dry_run: bool,
}

impl<'a, S> PlaylistsCleaner<'a, S>
where
    S: MediaServer + ?Sized,
{
    pub fn new(server: &'a S, dry_run: bool) -> Self {
        Self { server, dry_run }
    }

    /// If the playlists can not be listed at all the sweep ends right away
    pub async fn cleanup(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let playlists = match self.server.playlists().await {
            Ok(playlists) => playlists,
            Err(e) => {
                warn!("unable to list playlists, skipping them: {e:#}");
                report.skip("playlists", format!("{e:#}"));
                return report;
            }
        };
        debug!("found {} playlist(s)", playlists.len());

        for playlist in &playlists {
            let outcome = remove_if_empty(self.server, Kind::Playlist, playlist, self.dry_run).await;
            report.record(playlist.title(), outcome);
        }

        report
    }
}
