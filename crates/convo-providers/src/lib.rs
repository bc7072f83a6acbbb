//! # Provider Adapters
//!
//! External-service implementations of `convo-domain`'s
//! `VectorStoreProvider` port (spec §4.7, §6): an in-memory store for tests
//! and local development, and a generic HTTP adapter for a real remote
//! semantic index.

#![allow(missing_docs)]

#[cfg(feature = "vectorstore-memory")]
/// In-memory `VectorStoreProvider`, for tests and local development.
pub mod memory;

#[cfg(feature = "vectorstore-http")]
/// HTTP-based `VectorStoreProvider` adapter for a remote semantic index.
pub mod http;

#[cfg(feature = "vectorstore-memory")]
pub use memory::InMemoryVectorStore;

#[cfg(feature = "vectorstore-http")]
pub use http::HttpVectorStore;
