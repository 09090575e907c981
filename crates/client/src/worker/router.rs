//! Per-class retrieval strategies.
//!
//! | class                | strategy                                   |
//! |----------------------|--------------------------------------------|
//! | `NonCacheable`       | passthrough, store untouched               |
//! | `BlockedCrossOrigin` | unhandled, neither network nor store       |
//! | `AllowedCrossOrigin` | network, fall back to stored copy          |
//! | `RuntimeData`        | network-first, background write-back       |
//! | `StaticAsset`        | cache-first, write-back before returning   |
//!
//! Only 2xx responses within the store's size limit are ever written back;
//! anything else is still served. When the network fails and no stored copy
//! exists the network error is returned unchanged.

use shellcache_core::{Error, RequestClass, ResponseData, WorkerRequest};

use super::{CacheWorker, Interception, ResponseSource, ServedResponse};

fn served(class: RequestClass, source: ResponseSource, response: ResponseData) -> Interception {
    Interception::Response(ServedResponse { class, source, response })
}

impl CacheWorker {
    /// Interception entry point.
    pub async fn handle(&self, request: WorkerRequest) -> Result<Interception, Error> {
        let class = self.classifier.classify(&request.method, &request.url);
        tracing::debug!(method = %request.method, url = %request.url, %class, "routing request");

        match class {
            RequestClass::NonCacheable => self.passthrough(class, &request).await,
            RequestClass::BlockedCrossOrigin => Ok(Interception::Unhandled),
            RequestClass::AllowedCrossOrigin => self.network_with_fallback(class, &request).await,
            RequestClass::RuntimeData => self.network_first(class, request).await,
            RequestClass::StaticAsset => self.cache_first(class, request).await,
        }
    }

    async fn passthrough(&self, class: RequestClass, request: &WorkerRequest) -> Result<Interception, Error> {
        let response = self.network.fetch(request).await?;
        Ok(served(class, ResponseSource::Network, response))
    }

    async fn network_with_fallback(&self, class: RequestClass, request: &WorkerRequest) -> Result<Interception, Error> {
        match self.network.fetch(request).await {
            Ok(response) => Ok(served(class, ResponseSource::Network, response)),
            Err(err) => self.fallback(class, request, err).await,
        }
    }

    async fn network_first(&self, class: RequestClass, request: WorkerRequest) -> Result<Interception, Error> {
        match self.network.fetch(&request).await {
            Ok(response) => {
                if self.storable(&request, &response) {
                    self.spawn_write_back(request, response.clone()).await;
                }
                Ok(served(class, ResponseSource::Network, response))
            }
            Err(err) => self.fallback(class, &request, err).await,
        }
    }

    async fn cache_first(&self, class: RequestClass, request: WorkerRequest) -> Result<Interception, Error> {
        if let Some(response) = self.lookup(&request).await {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(served(class, ResponseSource::Cache, response));
        }

        tracing::debug!(url = %request.url, "cache miss");
        let response = self.network.fetch(&request).await?;

        if self.storable(&request, &response)
            && let Err(e) = self.db.put_entry(self.config.generation.as_str(), &request, &response).await
        {
            tracing::warn!(url = %request.url, error = %e, "failed to store fetched asset");
        }

        Ok(served(class, ResponseSource::Network, response))
    }

    /// Serve the stored copy after a network failure, or surface the failure.
    async fn fallback(&self, class: RequestClass, request: &WorkerRequest, err: Error) -> Result<Interception, Error> {
        match self.lookup(request).await {
            Some(response) => {
                tracing::debug!(url = %request.url, error = %err, "network failed; serving stored copy");
                Ok(served(class, ResponseSource::Cache, response))
            }
            None => Err(err),
        }
    }

    /// Best stored response for the request; store errors read as a miss.
    async fn lookup(&self, request: &WorkerRequest) -> Option<ResponseData> {
        match self.db.match_request(request, self.config.generation.as_str()).await {
            Ok(entry) => entry.map(|e| e.response),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }
}
