//! HTTP adapter for the library REST API.
//!
//! One [`HttpLibraryGateway`] implements every backend port against a single
//! base URL, attaching the bearer token held by the injected session store.

mod client;
mod dto;

pub use client::HttpLibraryGateway;
