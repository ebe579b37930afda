//! Library desk client.
//!
//! The crate is laid out as a hexagon:
//!
//! - [`domain`] holds the catalogue types, the borrow/return lifecycle, the
//!   authorization gate, and the driving services. Its [`domain::ports`]
//!   module declares the boundaries towards the backend and the session store.
//! - [`outbound`] provides adapters for those ports: the reqwest gateway, the
//!   file-backed session store, and an in-memory library backend.
//! - [`inbound`] provides the command-line front end.
//! - [`settings`] loads client configuration through OrthoConfig.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;
