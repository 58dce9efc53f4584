// ABOUTME: Runtime detection for the local system.
// ABOUTME: Checks for Podman sockets first, then Docker.

use super::types::{RuntimeConfig, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Pick the runtime to drive.
///
/// An explicit type in `config` wins. Otherwise detection order is:
/// 1. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Docker socket (`/var/run/docker.sock`)
pub fn detect_local(config: &RuntimeConfig) -> Result<RuntimeType, DetectionError> {
    if let Some(runtime) = config.runtime {
        return Ok(runtime);
    }
    detect_with(get_uid().as_deref(), |path| path.exists())
}

fn detect_with(
    uid: Option<&str>,
    exists: impl Fn(&Path) -> bool,
) -> Result<RuntimeType, DetectionError> {
    if let Some(uid) = uid {
        let rootless_socket = format!("/run/user/{uid}/podman/podman.sock");
        if exists(Path::new(&rootless_socket)) {
            return Ok(RuntimeType::Podman);
        }
    }

    if exists(Path::new(ROOTFUL_PODMAN)) {
        return Ok(RuntimeType::Podman);
    }

    if exists(Path::new(DOCKER_SOCKET)) {
        return Ok(RuntimeType::Docker);
    }

    Err(DetectionError::NoRuntimeFound)
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        // Fall back to reading /proc/self/status
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}
