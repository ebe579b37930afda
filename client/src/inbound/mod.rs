//! Inbound adapters driving the domain.
//!
//! The command-line front end is the only driver: it parses arguments,
//! enters each command's view through the authorization gate, and renders
//! results as plain text.

pub mod cli;
