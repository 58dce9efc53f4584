// ABOUTME: Config scaffolding for new hosts.
// ABOUTME: Creates a commented dockyard.yml template with the default values.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(&Config::default());
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"# Where application working trees are checked out (one directory per app)
apps_dir: {}
# Application records and deploy locks
state_dir: {}

# Container runtime: docker or podman (auto-detected when omitted)
# runtime:
#   type: docker
#   binary: /usr/bin/docker

git_binary: {}

github:
  api_url: {}
  timeout: {}

build:
  descriptor: {}
  diagnostic_tail: {}

ports:
  # Application N is published on host port internal_base + N
  internal_base: {}

lock_stale_after: {}
"#,
        config.apps_dir.display(),
        config.state_dir.display(),
        config.git_binary,
        config.github.api_url,
        humantime::format_duration(config.github.timeout),
        config.build.descriptor,
        config.build.diagnostic_tail,
        config.ports.internal_base,
        humantime::format_duration(config.lock_stale_after),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_back_to_defaults() {
        let yaml = generate_template_yaml(&Config::default());
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
