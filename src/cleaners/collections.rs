use super::{Kind, SweepReport, remove_if_empty};
use crate::services::MediaServer;
use log::{debug, warn};

/// CollectionsCleaner deletes collections without any items from the
/// configured library sections.
pub struct CollectionsCleaner<'a, S: ?Sized> {
    server: &'a S,
    dry_run: bool,
}

impl<'a, S> CollectionsCleaner<'a, S>
where
    S: MediaServer + ?Sized,
{
    pub fn new(server: &'a S, dry_run: bool) -> Self {
        Self { server, dry_run }
    }

    /// Sweep every library in `library_names`. A library that can not be
    /// resolved or listed is skipped, the remaining ones are still swept.
    pub async fn cleanup<'n>(&self, library_names: impl IntoIterator<Item = &'n str>) -> SweepReport {
        let mut report = SweepReport::default();

        for name in library_names {
            let section = match self.server.library_section(name).await {
                Ok(section) => section,
                Err(e) => {
                    warn!("unable to find library \"{name}\", skipping it: {e:#}");
                    report.skip(format!("library \"{name}\""), format!("{e:#}"));
                    continue;
                }
            };

            let collections = match self.server.collections(&section).await {
                Ok(collections) => collections,
                Err(e) => {
                    warn!("unable to list collections of library \"{name}\", skipping it: {e:#}");
                    report.skip(format!("library \"{name}\""), format!("{e:#}"));
                    continue;
                }
            };
            debug!("found {} collection(s) in library \"{name}\"", collections.len());

            for collection in &collections {
                let outcome =
                    remove_if_empty(self.server, Kind::Collection, collection, self.dry_run).await;
                report.record(collection.title(), outcome);
            }
        }

        report
    }
}
