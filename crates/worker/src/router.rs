//! Request classification.
//!
//! Every intercepted same-origin GET is assigned exactly one class, first
//! match wins: navigation, JSON data, script/style, image, then a catch-all.
//!
//! Classification uses only the request mode, the path extension, and the
//! Accept header. The platform "destination" hint is not part of the model.

use crate::request::{FetchRequest, RequestMode};
use url::Url;

/// The strategy class a request routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Full-page load: cache-lookup chain with shell and offline fallback.
    Navigation,
    /// JSON data: network first, cache fallback.
    Data,
    /// Script or stylesheet: stale-while-revalidate.
    Asset,
    /// Image: cache first, bounded partition.
    Image,
    /// Everything else same-origin: network, cache on failure.
    Other,
}

const DATA_EXTENSIONS: &[&str] = &["json"];
const ASSET_EXTENSIONS: &[&str] = &["js", "mjs", "css"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg", "gif", "ico", "avif"];

/// The lowercased extension of the URL's final path segment, if any.
fn path_extension(url: &Url) -> Option<String> {
    let segment = url.path().rsplit('/').next()?;
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

fn has_extension(url: &Url, extensions: &[&str]) -> bool {
    path_extension(url).is_some_and(|ext| extensions.contains(&ext.as_str()))
}

fn accepts_json(request: &FetchRequest) -> bool {
    request
        .accept
        .as_deref()
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Classify an intercepted request. `url` is the parsed form of
/// `request.url`; the caller has already ruled out non-GET, cross-origin,
/// and bypass-listed requests.
pub fn classify(request: &FetchRequest, url: &Url) -> RequestClass {
    if request.mode == RequestMode::Navigate {
        return RequestClass::Navigation;
    }
    if has_extension(url, DATA_EXTENSIONS) || accepts_json(request) {
        return RequestClass::Data;
    }
    if has_extension(url, ASSET_EXTENSIONS) {
        return RequestClass::Asset;
    }
    if has_extension(url, IMAGE_EXTENSIONS) {
        return RequestClass::Image;
    }
    RequestClass::Other
}
