//! Request and response types at the interception boundary.

use bytes::Bytes;
use shellcache_client::FetchResponse;
use shellcache_core::CacheEntry;
use shellcache_core::cache::request_key;

/// How the intercepted request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A full-page load.
    Navigate,
    /// Any subresource request (script, style, image, data, ...).
    Subresource,
}

/// An intercepted request, as handed to the worker.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// HTTP method. Only GET is ever cacheable.
    pub method: String,
    /// Raw request URL. A malformed URL makes the worker pass the
    /// request through rather than intercept it.
    pub url: String,
    pub mode: RequestMode,
    /// Accept header, if the request carried one.
    pub accept: Option<String>,
}

impl FetchRequest {
    /// A plain subresource GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: "GET".into(), url: url.into(), mode: RequestMode::Subresource, accept: None }
    }

    /// A full-page navigation.
    pub fn navigation(url: impl Into<String>) -> Self {
        Self { method: "GET".into(), url: url.into(), mode: RequestMode::Navigate, accept: None }
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }
}

/// Where a response came from, for logging and assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServedFrom {
    /// Live network response.
    Network,
    /// Cached snapshot from the named partition.
    Cache { partition: String },
    /// A designated fallback resource (offline page, default data,
    /// placeholder image).
    Fallback,
    /// Synthesized by the worker because nothing else was available.
    Synthesized,
}

/// The response the worker resolves an intercepted request with.
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub served_from: ServedFrom,
}

impl WorkerResponse {
    /// Build a response from a cached snapshot.
    pub fn from_entry(entry: CacheEntry, served_from: ServedFrom) -> Self {
        Self {
            status: entry.status,
            content_type: entry.content_type,
            body: Bytes::from(entry.body),
            served_from,
        }
    }

    /// Build a response from a live network fetch.
    pub fn from_network(response: &FetchResponse) -> Self {
        Self {
            status: response.status.as_u16(),
            content_type: response.content_type.clone(),
            body: response.bytes.clone(),
            served_from: ServedFrom::Network,
        }
    }

    /// Synthesize a response from nothing.
    pub fn synthesized(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: Some(content_type.to_string()),
            body: body.into(),
            served_from: ServedFrom::Synthesized,
        }
    }
}

/// The worker's decision for one intercepted request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Do not intercept; let the platform perform its default fetch.
    /// Applies to non-GET methods, malformed URLs, cross-origin
    /// requests, and bypass-listed hosts.
    Passthrough,
    /// Respond with this, never surfacing an error to the page.
    Respond(WorkerResponse),
}

impl FetchOutcome {
    /// The response, if the worker decided to intercept.
    pub fn response(&self) -> Option<&WorkerResponse> {
        match self {
            FetchOutcome::Respond(response) => Some(response),
            FetchOutcome::Passthrough => None,
        }
    }
}

/// Capture an immutable snapshot of a network response for a partition.
///
/// Headers are flattened to `[name, value]` string pairs; values that are
/// not valid UTF-8 are dropped. `stored_at` is stamped here, which is
/// what age-based image eviction later keys off.
pub fn snapshot(cache_name: &str, response: &FetchResponse) -> CacheEntry {
    let headers: Vec<(String, String)> = response
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    CacheEntry {
        cache_name: cache_name.to_string(),
        key: request_key(response.url.as_str()),
        url: response.url.to_string(),
        status: response.status.as_u16(),
        content_type: response.content_type.clone(),
        headers_json: serde_json::to_string(&headers).ok(),
        body: response.bytes.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fake_response;

    #[test]
    fn test_snapshot_captures_response() {
        let response = fake_response("https://example.com/assets/style.css", "text/css", b"body{}".to_vec());
        let entry = snapshot("shellcache-v1-runtime", &response);

        assert_eq!(entry.cache_name, "shellcache-v1-runtime");
        assert_eq!(entry.url, "https://example.com/assets/style.css");
        assert_eq!(entry.status, 200);
        assert_eq!(entry.body, b"body{}");
        assert_eq!(entry.key, request_key("https://example.com/assets/style.css"));
        assert!(chrono::DateTime::parse_from_rfc3339(&entry.stored_at).is_ok());
    }

    #[test]
    fn test_worker_response_from_entry() {
        let response = fake_response("https://example.com/index.html", "text/html", b"<html>".to_vec());
        let entry = snapshot("shellcache-v1-precache", &response);
        let served = WorkerResponse::from_entry(entry, ServedFrom::Cache { partition: "shellcache-v1-precache".into() });

        assert_eq!(served.status, 200);
        assert_eq!(served.body.as_ref(), b"<html>");
        assert_eq!(served.served_from, ServedFrom::Cache { partition: "shellcache-v1-precache".into() });
    }

    #[test]
    fn test_request_builders() {
        let request = FetchRequest::navigation("https://example.com/doctors");
        assert_eq!(request.mode, RequestMode::Navigate);
        assert_eq!(request.method, "GET");

        let request = FetchRequest::get("https://example.com/api").with_accept("application/json");
        assert_eq!(request.accept.as_deref(), Some("application/json"));
    }
}
