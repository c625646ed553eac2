//! Configuration loading

use anyhow::Result;

use crate::Config;

/// Load configuration from a config file or environment variables
///
/// Config file search order:
/// 1. `explicit_path` (from the `--config` flag), which must exist
/// 2. `HLSGATE_CONFIG_PATH`, if it names an existing file
/// 3. ./config.yaml (current working directory)
/// 4. /config/config.yaml (Kubernetes mount path)
/// 5. Fall back to environment variables only
///
/// Runs before logging is initialized, so progress goes to stderr.
pub fn load_config(explicit_path: Option<&str>) -> Result<Config> {
    let config_path = match explicit_path {
        Some(path) if !std::path::Path::new(path).exists() => {
            return Err(anyhow::anyhow!("Config file {path} does not exist"));
        }
        Some(path) => Some(path.to_string()),
        None => std::env::var("HLSGATE_CONFIG_PATH")
            .ok()
            .and_then(|p| existing(&p))
            .or_else(|| existing("config.yaml"))
            .or_else(|| existing("/config/config.yaml")),
    };

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        Config::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load {path}: {e}"))?
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?
    };

    // Fail fast on misconfigurations
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}

fn existing(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .exists()
        .then(|| path.to_string())
}
