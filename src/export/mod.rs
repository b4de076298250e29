//! Network export.
//!
//! A generated network is written once per capacity fraction, to
//! `<output>/capacity-<fraction>/network.<ext>`, in a format picked by name.

pub mod gml;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::GeneratorError;
use crate::network::types::PlasmaNetwork;
use crate::utils::naming::{capacity_dir_name, decimal_digits};

pub use gml::to_gml;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
    Gml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Yaml, ExportFormat::Gml];

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
            ExportFormat::Gml => "gml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
            ExportFormat::Gml => "gml",
        }
    }

    /// Serialize `network` in this format
    pub fn render(self, network: &PlasmaNetwork) -> Result<String> {
        let content = match self {
            ExportFormat::Json => serde_json::to_string_pretty(network).wrap_err("Failed to serialize network to JSON")?,
            ExportFormat::Yaml => serde_yaml::to_string(network).wrap_err("Failed to serialize network to YAML")?,
            ExportFormat::Gml => to_gml(network),
        };
        Ok(content)
    }
}

impl FromStr for ExportFormat {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GeneratorError::UnknownExportFormat {
                name: s.to_string(),
                supported: ExportFormat::ALL.map(ExportFormat::name).join(", "),
            })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write one network to `<output_dir>/<capacity dir>/network.<ext>`
pub fn write_network(
    network: &PlasmaNetwork,
    format: ExportFormat,
    output_dir: &Path,
    fraction: f64,
    digits: usize,
) -> Result<PathBuf> {
    let dir = output_dir.join(capacity_dir_name(fraction, digits));
    fs::create_dir_all(&dir).wrap_err_with(|| format!("Failed to create output directory '{}'", dir.display()))?;
    let path = dir.join(format!("network.{}", format.extension()));
    fs::write(&path, format.render(network)?).wrap_err_with(|| format!("Failed to write '{}'", path.display()))?;
    Ok(path)
}

/// Write every scaled copy; directory names share the number of decimals
/// needed by the most precise fraction.
pub fn write_scaled_networks(
    copies: &[(f64, PlasmaNetwork)],
    format: ExportFormat,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let digits = copies
        .iter()
        .map(|(fraction, _)| decimal_digits(*fraction))
        .max()
        .unwrap_or(1);
    let mut paths = Vec::with_capacity(copies.len());
    for (fraction, network) in copies {
        let path = write_network(network, format, output_dir, *fraction, digits)?;
        info!("Wrote capacity fraction {} to {:?}", fraction, path);
        paths.push(path);
    }
    Ok(paths)
}
