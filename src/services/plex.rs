use super::{Connect, MediaServer};
use crate::http::{LibrarySection, Metadata, PlexClient};
use anyhow::anyhow;
use async_trait::async_trait;
use log::{debug, info};

/// A session with a Plex Media Server
pub struct Plex {
    client: PlexClient,
}

impl Plex {
    /// Build a client and make sure the server answers with the given token.
    /// Connection errors are returned as is, there is no retry here.
    pub async fn connect(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let client = PlexClient::new(base_url, token)?;
        let identity = client.identity().await?;
        info!(
            "connected to Plex server \"{}\" (version {})",
            identity.friendly_name.as_deref().unwrap_or(base_url),
            identity.version.as_deref().unwrap_or("unknown"),
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaServer for Plex {
    async fn library_section(&self, name: &str) -> anyhow::Result<LibrarySection> {
        let section = self
            .client
            .sections()
            .await?
            .into_iter()
            .find(|section| section.title == name)
            .ok_or_else(|| anyhow!("library section \"{name}\" not found"))?;
        debug!(
            "resolved library \"{name}\" to section {} ({})",
            section.key,
            section.kind.as_deref().unwrap_or("unknown type")
        );
        Ok(section)
    }

    async fn collections(&self, section: &LibrarySection) -> anyhow::Result<Vec<Metadata>> {
        self.client.collections(&section.key).await
    }

    async fn collection_item_count(&self, collection: &Metadata) -> anyhow::Result<usize> {
        self.client.collection_item_count(&collection.rating_key).await
    }

    async fn delete_collection(&self, collection: &Metadata) -> anyhow::Result<()> {
        self.client.delete_collection(&collection.rating_key).await
    }

    async fn playlists(&self) -> anyhow::Result<Vec<Metadata>> {
        self.client.playlists().await
    }

    async fn playlist_item_count(&self, playlist: &Metadata) -> anyhow::Result<usize> {
        self.client.playlist_item_count(&playlist.rating_key).await
    }

    async fn delete_playlist(&self, playlist: &Metadata) -> anyhow::Result<()> {
        self.client.delete_playlist(&playlist.rating_key).await
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PlexConnector;

#[async_trait]
impl Connect for PlexConnector {
    type Server = Plex;

    async fn connect(&self, base_url: &str, token: &str) -> anyhow::Result<Plex> {
        Plex::connect(base_url, token).await
    }
}
