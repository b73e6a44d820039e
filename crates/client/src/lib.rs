//! Client code for shellcache.
//!
//! This crate provides the HTTP fetch pipeline behind the `Network` trait,
//! so the worker's strategies can be exercised against a fake network.

pub mod fetch;

pub use fetch::{FetchConfig, FetchResponse, HttpClient, Network, NetworkRequest};
