pub mod plex;

use crate::http::{LibrarySection, Metadata};
use async_trait::async_trait;

pub use plex::PlexConnector;

/// Operations the sweeps need from a media server session. Collections and
/// playlists are both addressed by their [`Metadata`] handle.
#[async_trait]
pub trait MediaServer {
    /// Resolve a library section by its name. Fails if no such section exists.
    async fn library_section(&self, name: &str) -> anyhow::Result<LibrarySection>;
    async fn collections(&self, section: &LibrarySection) -> anyhow::Result<Vec<Metadata>>;
    /// Number of items in a collection
    async fn collection_item_count(&self, collection: &Metadata) -> anyhow::Result<usize>;
    async fn delete_collection(&self, collection: &Metadata) -> anyhow::Result<()>;
    async fn playlists(&self) -> anyhow::Result<Vec<Metadata>>;
    async fn playlist_item_count(&self, playlist: &Metadata) -> anyhow::Result<usize>;
    async fn delete_playlist(&self, playlist: &Metadata) -> anyhow::Result<()>;
}

/// Opens a new media server session for every cleanup cycle
#[async_trait]
pub trait Connect {
    type Server: MediaServer + Send + Sync;

    async fn connect(&self, base_url: &str, token: &str) -> anyhow::Result<Self::Server>;
}

#[cfg(test)]
pub mod fake;
