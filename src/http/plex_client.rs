use super::ResponseExt;
use anyhow::Context;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, Url};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};

/// A client for the Plex Media Server HTTP API.
/// https://developer.plex.tv/pms/
#[derive(Clone)]
pub struct PlexClient {
    client: Client,
    base_url: Url,
}

impl PlexClient {
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let default_headers = default_headers(token)?;
        let client = ClientBuilder::new()
            .default_headers(default_headers)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Server identity, used to check that the server is reachable and the
    /// token is accepted.
    pub async fn identity(&self) -> anyhow::Result<ServerIdentity> {
        self.get("").await
    }

    /// All library sections of the server.
    /// https://developer.plex.tv/pms/#tag/Library/operation/getSections
    pub async fn sections(&self) -> anyhow::Result<Vec<LibrarySection>> {
        let container: DirectoryContainer = self.get("library/sections").await?;
        Ok(container.directory)
    }

    /// Collections of a library section.
    pub async fn collections(&self, section_key: &str) -> anyhow::Result<Vec<Metadata>> {
        let path = format!("library/sections/{section_key}/collections");
        self.metadata(&path).await
    }

    /// Number of items that belong to a collection.
    pub async fn collection_item_count(&self, rating_key: &str) -> anyhow::Result<usize> {
        let path = format!("library/collections/{rating_key}/children");
        self.item_count(&path).await
    }

    pub async fn delete_collection(&self, rating_key: &str) -> anyhow::Result<()> {
        self.delete(&format!("library/collections/{rating_key}"))
            .await
    }

    /// All playlists on the server.
    /// https://developer.plex.tv/pms/#tag/Playlist
    pub async fn playlists(&self) -> anyhow::Result<Vec<Metadata>> {
        self.metadata("playlists").await
    }

    /// Number of items that belong to a playlist.
    pub async fn playlist_item_count(&self, rating_key: &str) -> anyhow::Result<usize> {
        let path = format!("playlists/{rating_key}/items");
        self.item_count(&path).await
    }

    pub async fn delete_playlist(&self, rating_key: &str) -> anyhow::Result<()> {
        self.delete(&format!("playlists/{rating_key}")).await
    }

    async fn metadata(&self, path: &str) -> anyhow::Result<Vec<Metadata>> {
        let container: MetadataContainer = self.get(path).await?;
        Ok(container.metadata)
    }

    async fn item_count(&self, path: &str) -> anyhow::Result<usize> {
        let container: ItemsContainer = self.get(path).await?;
        Ok(container.items.len())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = self.base_url.join(path)?;
        let response = self
            .client
            .get(url)
            .send()
            .await?
            .handle_error()
            .await?
            .json::<Envelope<T>>()
            .await
            .with_context(|| format!("unexpected response from /{path}"))?;
        Ok(response.media_container)
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        let url = self.base_url.join(path)?;
        self.client
            .delete(url)
            .send()
            .await?
            .handle_error()
            .await?;
        Ok(())
    }
}

/// Endpoint paths are joined relative to the base URL, so a server that is
/// served under a sub-path needs a trailing slash to keep that sub-path.
fn normalize_base_url(base_url: &str) -> anyhow::Result<Url> {
    let mut url =
        Url::parse(base_url.trim()).with_context(|| format!("invalid Plex URL {base_url}"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_headers(token: &str) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut token = HeaderValue::from_str(token)?;
    token.set_sensitive(true);
    headers.insert("x-plex-token", token);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let product = HeaderValue::from_static(env!("CARGO_PKG_NAME"));
    headers.insert("x-plex-product", product.clone());
    headers.insert("x-plex-client-identifier", product);
    headers.insert(
        "x-plex-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    Ok(headers)
}

/// Every Plex JSON response is wrapped into a `MediaContainer` object
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Deserialize)]
struct DirectoryContainer {
    #[serde(rename = "Directory", default)]
    directory: Vec<LibrarySection>,
}

/// Plex omits the `Metadata` array entirely when a container is empty
#[derive(Deserialize)]
struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<Metadata>,
}

/// Items are only counted, so their fields are never looked at
#[derive(Deserialize)]
struct ItemsContainer {
    #[serde(rename = "Metadata", default)]
    items: Vec<IgnoredAny>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ServerIdentity {
    pub friendly_name: Option<String>,
    pub version: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A collection or a playlist. Only the fields used for addressing and
/// logging are kept.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub rating_key: String,
    pub title: Option<String>,
}

impl Metadata {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown")
    }
}
