// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates an imagewait.yml template file.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ImageRef;
use crate::wait::{Backoff, DEFAULT_REGISTRY, DEFAULT_TIMEOUT};

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, image: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let image = match image {
        Some(i) => ImageRef::parse(i).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => ImageRef::parse("my-app:latest").map_err(|e| Error::InvalidConfig(e.to_string()))?,
    };

    std::fs::write(&config_path, generate_template_yaml(&image))?;
    tracing::debug!("Wrote {}", config_path.display());

    Ok(())
}

fn generate_template_yaml(image: &ImageRef) -> String {
    let backoff = Backoff::default();
    format!(
        r#"registry: {}
image: {}
# Credentials can be literal values or read from the environment.
# username: ci
# password:
#   env: REGISTRY_PASSWORD
timeout: {}
fail_after_timeout: true
backoff:
  initial: {}ms
  step: {}ms
  max: {}ms
"#,
        DEFAULT_REGISTRY,
        image,
        DEFAULT_TIMEOUT.as_secs(),
        backoff.initial().as_millis(),
        backoff.step().as_millis(),
        backoff.max().as_millis(),
    )
}
