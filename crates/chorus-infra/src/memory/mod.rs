//! Remote memory backends.
//!
//! [`http::HttpMemoryBackend`] implements the `MemoryBackend` trait from
//! `chorus-core` against a remote memory service. The semantic store wraps
//! it and falls back to local heuristics when it fails.

pub mod http;
