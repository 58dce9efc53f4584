// ABOUTME: Builds the store and orchestrator a command needs from config.
// ABOUTME: Detects the local container runtime and wires the system command runner.

use dockyard::config::Config;
use dockyard::deploy::Orchestrator;
use dockyard::error::Result;
use dockyard::process::SystemRunner;
use dockyard::runtime::detect_local;
use dockyard::source::GithubMetadata;
use dockyard::store::JsonFileStore;
use std::sync::Arc;

pub async fn open_store(config: &Config) -> Result<Arc<JsonFileStore>> {
    let store = JsonFileStore::open(config.store_path(), config.ports.internal_base).await?;
    Ok(Arc::new(store))
}

/// Orchestrator backed by the JSON store, the local runtime, and GitHub.
pub async fn orchestrator(config: &Config) -> Result<Orchestrator> {
    let runtime = detect_local(&config.runtime)?;
    tracing::debug!(%runtime, "using container runtime");

    let store = open_store(config).await?;
    let oracle = GithubMetadata::new(&config.github)?;

    Ok(Orchestrator::from_config(
        config,
        runtime,
        store,
        Arc::new(SystemRunner),
        Arc::new(oracle),
    ))
}
