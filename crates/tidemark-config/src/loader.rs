use std::path::Path;

use tidemark_common::{Error, Result};
use tracing::{debug, info};

use crate::model::MigratorConfig;

/// Reads a `MigratorConfig` from a YAML or TOML file.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> Result<MigratorConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`ConfigLoader::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<MigratorConfig> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(MigratorConfig::default());
        }
        Self::load(path)
    }
}
