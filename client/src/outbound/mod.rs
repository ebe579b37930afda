//! Outbound adapters implementing domain ports.
//!
//! - **http**: reqwest gateway for the library REST API
//! - **session_file**: session store persisted to a JSON file via cap-std
//! - **memory**: in-process library backend applying the service's rules
//!
//! Adapters translate between domain types and their transport or storage
//! shape. Session clearing and error mapping live in the domain.

pub mod http;
pub mod memory;
pub mod session_file;

pub use http::HttpLibraryGateway;
pub use memory::InMemoryLibrary;
pub use session_file::FileSessionStore;
