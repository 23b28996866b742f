mod collections;
mod playlists;

pub use collections::CollectionsCleaner;
pub use playlists::PlaylistsCleaner;

use crate::{http::Metadata, services::MediaServer};
use log::{debug, info, warn};
use std::fmt::{self, Display};

/// What happened to a single collection or playlist during a sweep
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Deleted,
    /// empty, but left in place because of a dry run
    WouldDelete,
    /// has at least one item
    Kept,
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub target: String,
    pub reason: String,
}

/// Aggregated outcomes of one sweep
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    pub deleted: Vec<String>,
    pub would_delete: Vec<String>,
    pub kept: usize,
    pub skipped: Vec<Skipped>,
}

impl SweepReport {
    fn record(&mut self, title: &str, outcome: Outcome) {
        match outcome {
            Outcome::Deleted => self.deleted.push(title.to_string()),
            Outcome::WouldDelete => self.would_delete.push(title.to_string()),
            Outcome::Kept => self.kept += 1,
            Outcome::Skipped(reason) => self.skip(title, reason),
        }
    }

    fn skip(&mut self, target: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(Skipped {
            target: target.into(),
            reason: reason.into(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Collection,
    Playlist,
}

impl Kind {
    async fn item_count<S>(self, server: &S, object: &Metadata) -> anyhow::Result<usize>
    where
        S: MediaServer + ?Sized,
    {
        match self {
            Kind::Collection => server.collection_item_count(object).await,
            Kind::Playlist => server.playlist_item_count(object).await,
        }
    }

    async fn delete<S>(self, server: &S, object: &Metadata) -> anyhow::Result<()>
    where
        S: MediaServer + ?Sized,
    {
        match self {
            Kind::Collection => server.delete_collection(object).await,
            Kind::Playlist => server.delete_playlist(object).await,
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Collection => f.write_str("collection"),
            Kind::Playlist => f.write_str("playlist"),
        }
    }
}

/// Delete `object` if it has no items. Failures are logged and reported as
/// [`Outcome::Skipped`] so the caller can move on to the next object.
///
/// The items check and the delete are two separate requests. An item added
/// in between is lost together with its container.
async fn remove_if_empty<S>(server: &S, kind: Kind, object: &Metadata, dry_run: bool) -> Outcome
where
    S: MediaServer + ?Sized,
{
    let title = object.title();
    let count = match kind.item_count(server, object).await {
        Ok(count) => count,
        Err(e) => {
            warn!("unable to query items of {kind} \"{title}\": {e:#}");
            return Outcome::Skipped(format!("items query failed: {e:#}"));
        }
    };

    if count > 0 {
        debug!("{kind} \"{title}\" has {count} item(s), keeping it");
        return Outcome::Kept;
    }

    info!("{}", removal_message(kind, title, dry_run));
    if dry_run {
        return Outcome::WouldDelete;
    }

    match kind.delete(server, object).await {
        Ok(()) => Outcome::Deleted,
        Err(e) => {
            warn!("unable to delete {kind} \"{title}\": {e:#}");
            Outcome::Skipped(format!("delete failed: {e:#}"))
        }
    }
}

fn removal_message(kind: Kind, title: &str, dry_run: bool) -> String {
    if dry_run {
        format!("Would delete empty {kind}: {title} (dry run)")
    } else {
        format!("Deleting empty {kind}: {title}")
    }
}
