//! Test fixtures shared by the tool modules.

use async_trait::async_trait;
use shellcache_client::{CacheWorker, Network, WorkerConfig};
use shellcache_core::{CacheDb, Error, GenerationId, PrecacheManifest, ResponseData, WorkerRequest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

pub(crate) const ORIGIN: &str = "https://exhibit.example/";

/// Serves fixed bodies by absolute URL; everything else is offline.
#[derive(Default)]
pub(crate) struct StubNetwork {
    pages: Mutex<HashMap<String, (u16, String)>>,
}

impl StubNetwork {
    pub(crate) fn with(pages: &[(&str, u16, &str)]) -> Arc<Self> {
        let stub = Self::default();
        {
            let mut map = stub.pages.lock().unwrap();
            for (url, status, body) in pages {
                map.insert(url.to_string(), (*status, body.to_string()));
            }
        }
        Arc::new(stub)
    }

    pub(crate) fn go_offline(&self) {
        self.pages.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &WorkerRequest) -> Result<ResponseData, Error> {
        let url = request.url.to_string();
        let page = self.pages.lock().unwrap().get(&url).cloned();
        match page {
            Some((status, body)) => Ok(ResponseData {
                url,
                status,
                headers: vec![("content-type".into(), "text/html".into())],
                body: body.into(),
            }),
            None => Err(Error::Network(format!("network error: unreachable {url}"))),
        }
    }
}

pub(crate) async fn worker(network: Arc<StubNetwork>, version: &str, manifest: &[&str]) -> CacheWorker {
    worker_on(CacheDb::open_in_memory().await.unwrap(), network, version, manifest)
}

pub(crate) fn worker_on(db: CacheDb, network: Arc<StubNetwork>, version: &str, manifest: &[&str]) -> CacheWorker {
    let config = WorkerConfig {
        origin: Url::parse(ORIGIN).unwrap(),
        allowlist_hosts: vec!["unpkg.com".into()],
        generation: GenerationId::new("app", version),
        manifest: PrecacheManifest::new(manifest.iter().copied()),
        install_concurrency: 2,
        max_entry_bytes: 1024 * 1024,
    };
    CacheWorker::new(db, network, config)
}

/// Pull the JSON text out of a tool result.
pub(crate) fn output_json(result: &rmcp::model::CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
