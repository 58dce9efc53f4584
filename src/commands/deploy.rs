// ABOUTME: Deploy command implementation.
// ABOUTME: Runs the pipeline for one application and reports warnings and failures.

use super::context::orchestrator;
use dockyard::config::Config;
use dockyard::diagnostics::Diagnostics;
use dockyard::error::{Error, Result};
use dockyard::output::Output;
use dockyard::types::ApplicationId;

/// Deploy one application and print its final status.
pub async fn deploy(config: &Config, id: ApplicationId, mut output: Output) -> Result<()> {
    let orchestrator = orchestrator(config).await?;
    let mut diag = Diagnostics::default();

    output.start_timer();
    output.progress(&format!("Deploying application {id}"));
    let result = orchestrator.deploy(id, &output, &mut diag).await;

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let status = result?;
    let record = orchestrator.store().load(id).await?;
    output.success(&format!(
        "Application {id} is {status} on port {}",
        record.internal_port
    ));
    Ok(())
}

/// Print a top-level error, with stage and kind for deploy failures.
pub fn report_error(output: &Output, error: &Error) {
    match error {
        Error::Deploy(e) => {
            let stage = e
                .stage()
                .map(|s| format!("{s} stage, "))
                .unwrap_or_default();
            output.error(&format!("{e} ({stage}{:?})", e.kind()));
            if let Some(holder) = e.lock_holder_info() {
                output.error(&format!("lock held by {holder}"));
            }
        }
        other => output.error(&other.to_string()),
    }
}
