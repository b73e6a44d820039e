//! Shared test doubles: an in-memory store plus a scriptable fake network.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use shellcache_client::{FetchResponse, Network, NetworkRequest};
use shellcache_core::cache::request_key;
use shellcache_core::{AppConfig, CacheDb, CacheEntry, Error, PartitionKind};

use crate::handler::CacheWorker;

/// Scriptable network: URL -> (content type, body), plus an offline switch
/// and a request log.
pub(crate) struct FakeNetwork {
    responses: Mutex<HashMap<String, (String, Vec<u8>)>>,
    offline: AtomicBool,
    log: Mutex<Vec<NetworkRequest>>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            log: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn insert(&self, url: &str, content_type: &str, body: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), (content_type.to_string(), body));
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn requests_for(&self, url: &str) -> Vec<NetworkRequest> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url.as_str() == url)
            .cloned()
            .collect()
    }

    pub(crate) fn fetch_count(&self, url: &str) -> usize {
        self.requests_for(url).len()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &NetworkRequest) -> Result<FetchResponse, Error> {
        self.log.lock().unwrap().push(request.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::HttpError("offline".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        let Some((content_type, body)) = responses.get(request.url.as_str()) else {
            return Err(Error::HttpStatus(404));
        };
        Ok(fake_response(request.url.as_str(), content_type, body.clone()))
    }
}

/// A canned 200 response for conversion and snapshot tests.
pub(crate) fn fake_response(url: &str, content_type: &str, body: Vec<u8>) -> FetchResponse {
    let url = reqwest::Url::parse(url).unwrap();
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
    FetchResponse {
        url: url.clone(),
        final_url: url,
        status: StatusCode::OK,
        content_type: Some(content_type.to_string()),
        bytes: Bytes::from(body),
        headers,
        fetch_ms: 1,
    }
}

/// An in-memory worker wired to a fresh fake network.
pub(crate) async fn worker_with(config: AppConfig) -> (CacheWorker, Arc<FakeNetwork>) {
    let store = CacheDb::open_in_memory().await.unwrap();
    let net = FakeNetwork::new();
    let worker = worker_over(store, net.clone(), config);
    (worker, net)
}

/// A worker over an existing store and network, for version-bump tests.
pub(crate) fn worker_over(store: CacheDb, net: Arc<FakeNetwork>, config: AppConfig) -> CacheWorker {
    CacheWorker::new(store, net, config).unwrap()
}

/// Seed the current precache partition directly, bypassing the network.
pub(crate) async fn precache(worker: &CacheWorker, path: &str, content_type: &str, body: &[u8]) {
    let url = worker.resolve(path).unwrap();
    let entry = CacheEntry {
        cache_name: worker.partitions().name(PartitionKind::Precache),
        key: request_key(url.as_str()),
        url: url.to_string(),
        status: 200,
        content_type: Some(content_type.to_string()),
        headers_json: None,
        body: body.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    };
    worker.store().put_entry(&entry).await.unwrap();
}

/// Poll an async condition until it holds, panicking after ~1s.
pub(crate) async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 1s");
}
