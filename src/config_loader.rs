use crate::config::{Config, ModelParams};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use log::info;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

/// Parse a YAML or JSON file, chosen by extension (YAML when unknown)
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).wrap_err_with(|| format!("Failed to open {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let document = match extension.as_deref() {
        Some("json") => serde_json::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse JSON from {}", path.display()))?,
        Some("yaml") | Some("yml") | None => serde_yaml::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse YAML from {}", path.display()))?,
        Some(other) => bail!("Unsupported configuration format '{}' for {}", other, path.display()),
    };
    Ok(document)
}

/// Load and validate a generator configuration
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);
    let config: Config = read_document(config_path)?;
    config
        .validate()
        .wrap_err_with(|| format!("Invalid configuration in {}", config_path.display()))?;
    Ok(config)
}

/// Load a model-parameters record (capacities and weights per subnetwork)
pub fn load_model_params(params_path: &Path) -> Result<ModelParams> {
    info!("Loading model parameters from: {:?}", params_path);
    read_document(params_path)
}
