// ABOUTME: Library root for dockyard - deploys GitHub repositories as containers.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod process;
pub mod runtime;
pub mod source;
pub mod store;
pub mod types;
