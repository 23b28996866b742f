pub mod plex_client;

use log::debug;
pub use plex_client::{LibrarySection, Metadata, PlexClient};

use anyhow::bail;
use reqwest::Response;

trait ResponseExt {
    async fn handle_error(self) -> anyhow::Result<Response>;
}

impl ResponseExt for Response {
    async fn handle_error(self) -> anyhow::Result<Response> {
        let url = self.url();
        if self.status().is_success() {
            debug!("{} succeeded", url.path());
            Ok(self)
        } else {
            let status = self.status();
            let path = url.path().to_string();
            let body = self.text().await?;
            bail!("request to {path} failed with status {status}: {body}")
        }
    }
}
