use std::path::Path;

use anyhow::{Context, Result};

use crate::layout::{BuildLayout, GeneratorConfig};

/// Load the generator config for a layout, or the defaults when no config file exists.
pub fn load_generator_config(layout: &BuildLayout) -> Result<GeneratorConfig> {
    for candidate in &layout.config_candidates {
        if candidate.is_file() {
            return read_config_file(candidate);
        }
    }
    Ok(GeneratorConfig::default())
}

fn read_config_file(path: &Path) -> Result<GeneratorConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read generator config at {}", path.display()))?;
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let config = if is_json {
        serde_json::from_str(&body).context("Failed to parse generator config JSON")?
    } else {
        serde_yaml::from_str(&body).context("Failed to parse generator config YAML")?
    };
    Ok(config)
}
