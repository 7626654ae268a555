//! Visitor notes: a small list/create HTTP service over pluggable storage,
//! and the client-side sync layer that mirrors it into a local cache.

pub mod api;
pub mod config;
pub mod models;
pub mod store;
pub mod sync;
