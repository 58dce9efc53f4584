// ABOUTME: Command module aggregator for the dockyard CLI.
// ABOUTME: Re-exports application and deploy command handlers.

mod apps;
mod context;
mod deploy;

pub use apps::{create, list, show};
pub use deploy::{deploy, report_error};
