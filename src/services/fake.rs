//! In-memory media server used by the cleaner and scheduler tests.

use super::{Connect, MediaServer};
use crate::http::{LibrarySection, Metadata};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

#[derive(Clone)]
pub struct FakeObject {
    meta: Metadata,
    items: usize,
    fail_items: bool,
    fail_delete: bool,
}

impl FakeObject {
    pub fn new(rating_key: &str, title: &str, items: usize) -> Self {
        Self {
            meta: Metadata {
                rating_key: rating_key.to_string(),
                title: Some(title.to_string()),
            },
            items,
            fail_items: false,
            fail_delete: false,
        }
    }

    pub fn untitled(mut self) -> Self {
        self.meta.title = None;
        self
    }

    pub fn failing_items(mut self) -> Self {
        self.fail_items = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }
}

#[derive(Default)]
struct State {
    libraries: Vec<(String, Vec<FakeObject>)>,
    playlists: Vec<FakeObject>,
    fail_playlists: bool,
    deleted_collections: Vec<String>,
    deleted_playlists: Vec<String>,
}

/// Deleting an object removes it, so a second sweep sees the updated state
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(self, name: &str, collections: Vec<FakeObject>) -> Self {
        self.state
            .lock()
            .unwrap()
            .libraries
            .push((name.to_string(), collections));
        self
    }

    pub fn with_playlists(self, playlists: Vec<FakeObject>) -> Self {
        self.state.lock().unwrap().playlists = playlists;
        self
    }

    pub fn with_failing_playlists(self) -> Self {
        self.state.lock().unwrap().fail_playlists = true;
        self
    }

    pub fn deleted_collections(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_collections.clone()
    }

    pub fn deleted_playlists(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_playlists.clone()
    }

    fn find(&self, object: &Metadata, in_playlists: bool) -> anyhow::Result<FakeObject> {
        let state = self.state.lock().unwrap();
        let found = if in_playlists {
            state
                .playlists
                .iter()
                .find(|p| p.meta.rating_key == object.rating_key)
        } else {
            state
                .libraries
                .iter()
                .flat_map(|(_, collections)| collections.iter())
                .find(|c| c.meta.rating_key == object.rating_key)
        };
        found
            .cloned()
            .ok_or_else(|| anyhow!("no object with key {}", object.rating_key))
    }

    fn item_count(&self, object: &Metadata, in_playlists: bool) -> anyhow::Result<usize> {
        let found = self.find(object, in_playlists)?;
        if found.fail_items {
            bail!("items query failed for {}", object.rating_key);
        }
        Ok(found.items)
    }

    fn delete(&self, object: &Metadata, in_playlists: bool) -> anyhow::Result<()> {
        if self.find(object, in_playlists)?.fail_delete {
            bail!("delete failed for {}", object.rating_key);
        }
        let mut state = self.state.lock().unwrap();
        let title = object.title().to_string();
        let key = &object.rating_key;
        if in_playlists {
            state.playlists.retain(|p| &p.meta.rating_key != key);
            state.deleted_playlists.push(title);
        } else {
            for (_, collections) in state.libraries.iter_mut() {
                collections.retain(|c| &c.meta.rating_key != key);
            }
            state.deleted_collections.push(title);
        }
        Ok(())
    }
}

#[async_trait]
impl MediaServer for FakeServer {
    async fn library_section(&self, name: &str) -> anyhow::Result<LibrarySection> {
        let state = self.state.lock().unwrap();
        state
            .libraries
            .iter()
            .find(|(library, _)| library == name)
            .map(|(library, _)| LibrarySection {
                key: library.clone(),
                title: library.clone(),
                kind: None,
            })
            .ok_or_else(|| anyhow!("library section \"{name}\" not found"))
    }

    async fn collections(&self, section: &LibrarySection) -> anyhow::Result<Vec<Metadata>> {
        let state = self.state.lock().unwrap();
        let (_, collections) = state
            .libraries
            .iter()
            .find(|(library, _)| *library == section.key)
            .ok_or_else(|| anyhow!("unknown section {}", section.key))?;
        Ok(collections.iter().map(|c| c.meta.clone()).collect())
    }

    async fn collection_item_count(&self, collection: &Metadata) -> anyhow::Result<usize> {
        self.item_count(collection, false)
    }

    async fn delete_collection(&self, collection: &Metadata) -> anyhow::Result<()> {
        self.delete(collection, false)
    }

    async fn playlists(&self) -> anyhow::Result<Vec<Metadata>> {
        let state = self.state.lock().unwrap();
        if state.fail_playlists {
            bail!("unable to list playlists");
        }
        Ok(state.playlists.iter().map(|p| p.meta.clone()).collect())
    }

    async fn playlist_item_count(&self, playlist: &Metadata) -> anyhow::Result<usize> {
        self.item_count(playlist, true)
    }

    async fn delete_playlist(&self, playlist: &Metadata) -> anyhow::Result<()> {
        self.delete(playlist, true)
    }
}

/// Hands out the same [`FakeServer`] on every connect, or fails if no server
/// is set
#[derive(Clone, Default)]
pub struct FakeConnector {
    server: Option<FakeServer>,
    connects: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new(server: FakeServer) -> Self {
        Self {
            server: Some(server),
            connects: Arc::default(),
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connect for FakeConnector {
    type Server = FakeServer;

    async fn connect(&self, base_url: &str, _token: &str) -> anyhow::Result<FakeServer> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.server
            .clone()
            .ok_or_else(|| anyhow!("unable to connect to {base_url}"))
    }
}
