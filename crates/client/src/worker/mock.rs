//! Scripted [`Network`] for worker tests.

use async_trait::async_trait;
use bytes::Bytes;
use shellcache_core::{CacheDb, Error, GenerationId, PrecacheManifest, ResponseData, WorkerRequest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

use super::{CacheWorker, WorkerConfig};
use crate::fetch::Network;

pub(crate) const ORIGIN: &str = "https://exhibit.example/";

#[derive(Clone)]
enum Reply {
    Respond { status: u16, body: Bytes },
    Fail,
}

/// Replies by absolute URL; unknown URLs fail like an offline network.
#[derive(Default)]
pub(crate) struct MockNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl MockNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        let reply = Reply::Respond { status, body: Bytes::from(body.to_string()) };
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub(crate) fn fail(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Fail);
    }

    /// Total number of fetches issued.
    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.ends_with(url)).count()
    }

    /// Fetch a scripted URL directly, for seeding stores.
    pub(crate) async fn fetch_ok(&self, url: &str) -> ResponseData {
        self.fetch(&WorkerRequest::get(Url::parse(url).unwrap())).await.unwrap()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &WorkerRequest) -> Result<ResponseData, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(format!("{} {}", request.method, url));

        let reply = self.replies.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Respond { status, body }) => Ok(ResponseData {
                url,
                status,
                headers: vec![("content-type".into(), "text/plain".into())],
                body,
            }),
            Some(Reply::Fail) | None => Err(Error::Network(format!("network error: unreachable {url}"))),
        }
    }
}

pub(crate) fn absolute(path: &str) -> String {
    Url::parse(ORIGIN).unwrap().join(path).unwrap().to_string()
}

pub(crate) fn worker_config(generation: &str, manifest: &[&str]) -> WorkerConfig {
    WorkerConfig {
        origin: Url::parse(ORIGIN).unwrap(),
        allowlist_hosts: vec!["unpkg.com".into(), "googleapis.com".into()],
        generation: GenerationId::new("app", generation),
        manifest: PrecacheManifest::new(manifest.iter().copied()),
        install_concurrency: 2,
        max_entry_bytes: 1024,
    }
}

/// Worker over a fresh in-memory store, generation `app-v1`.
pub(crate) async fn test_worker(network: Arc<MockNetwork>, manifest: &[&str]) -> CacheWorker {
    let db = CacheDb::open_in_memory().await.unwrap();
    CacheWorker::new(db, network, worker_config("v1", manifest))
}
