//! Integration test suite for depmap
//!
//! End-to-end tests of the `depmap` binary, the HTTP registry client and the
//! HTTP server. Everything runs against local listeners bound to
//! `127.0.0.1:0`; no test touches the public registry.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: argument handling, exit codes and tree output of the binary
//! - **config**: configuration file loading through the binary
//! - **registry_client**: `RegistryClient` against a fake registry
//! - **server**: the axum server over real sockets

mod common;

mod cli;
mod config;
mod registry_client;
mod server;
