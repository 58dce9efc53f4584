// ABOUTME: Application registry commands: create, list, and show.
// ABOUTME: Prints records as text or JSON lines depending on output mode.

use super::context::{open_store, orchestrator};
use dockyard::config::Config;
use dockyard::error::Result;
use dockyard::output::{Output, OutputMode};
use dockyard::store::{ApplicationRecord, ApplicationStore};
use dockyard::types::{ApplicationId, ContainerPort};

/// Validate a repository and register it as a new application.
pub async fn create(
    config: &Config,
    repo: &str,
    container_port: ContainerPort,
    output: &Output,
) -> Result<()> {
    let orchestrator = orchestrator(config).await?;
    output.progress(&format!("  → Validating {repo}..."));

    let record = orchestrator.register(repo, container_port).await?;
    print_record(output, &record, false);
    output.success(&format!(
        "Created application {} on port {}",
        record.id, record.internal_port
    ));
    Ok(())
}

pub async fn list(config: &Config, output: &Output) -> Result<()> {
    let store = open_store(config).await?;
    let apps = store.list().await?;

    if output.mode() == OutputMode::Json {
        for app in &apps {
            print_record(output, app, false);
        }
        return Ok(());
    }

    if apps.is_empty() {
        output.progress("No applications registered");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:<12} {:<10} REPOSITORY",
        "ID", "SUBDOMAIN", "PORTS", "STATUS"
    );
    for app in &apps {
        let ports = format!("{}:{}", app.internal_port, app.container_port);
        println!(
            "{:<6} {:<12} {:<12} {:<10} {}",
            app.id, app.subdomain, ports, app.status, app.repo_url
        );
    }
    Ok(())
}

pub async fn show(config: &Config, id: ApplicationId, output: &Output) -> Result<()> {
    let store = open_store(config).await?;
    let record = store.load(id).await?;
    print_record(output, &record, true);
    Ok(())
}

fn print_record(output: &Output, record: &ApplicationRecord, detailed: bool) {
    match output.mode() {
        OutputMode::Json => match serde_json::to_string(record) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize record"),
        },
        OutputMode::Quiet if !detailed => {}
        _ => {
            println!("id:             {}", record.id);
            println!("repository:     {}", record.repo_url);
            println!("subdomain:      {}", record.subdomain);
            println!("internal port:  {}", record.internal_port);
            println!("container port: {}", record.container_port);
            println!("status:         {}", record.status);
            if detailed {
                println!("created:        {}", record.created_at);
                println!("updated:        {}", record.updated_at);
            }
        }
    }
}
