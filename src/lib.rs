// ABOUTME: Library root for hubstack - provisioning, TLS lifecycle and teardown of a service stack.
// ABOUTME: The main binary is in main.rs.

pub mod cert;
pub mod cleanup;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod dns;
pub mod error;
pub mod firewall;
pub mod manifest;
pub mod output;
pub mod process;
pub mod prompt;
pub mod runtime;
pub mod schedule;
pub mod slot;
pub mod types;
