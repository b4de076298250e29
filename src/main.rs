use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use plasmagen::config::{Config, NationsConfig};
use plasmagen::config_loader;
use plasmagen::export::{write_scaled_networks, ExportFormat};
use plasmagen::model::payment_subnetwork_models;
use plasmagen::network::{generate_plasma_network, postprocess, scale_to_fractions};

/// Topology generator for payment-channel network simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the generator configuration (YAML or JSON); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a model-parameters file replacing the `model` section of the configuration
    #[arg(short, long)]
    model_params: Option<PathBuf>,

    /// Output directory, one subdirectory per capacity fraction
    #[arg(short, long, default_value = "plasma_output")]
    output: PathBuf,

    /// Output format: json, yaml or gml
    #[arg(short, long, default_value = "json")]
    format: ExportFormat,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Use a single central bank for every nation
    #[arg(long)]
    unique_cb: bool,

    /// Comma-separated nations of equal weight, e.g. IT,FR,DE
    #[arg(long, value_delimiter = ',')]
    nations: Option<Vec<String>>,

    /// Comma-separated capacity fractions, e.g. 0.1,0.5,1.0
    #[arg(long, value_delimiter = ',')]
    capacity_fractions: Option<Vec<f64>>,

    /// Split nodes into this many deployment buckets
    #[arg(long)]
    deploy_partitions: Option<usize>,

    /// Only generate the subnetwork with this edge type, e.g. 2<>2
    #[arg(long)]
    subnetwork_filter: Option<String>,

    /// Model override as name=value, e.g. i2i_k=6 (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    overrides: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Merge command-line arguments into the loaded configuration
fn apply_args(config: &mut Config, args: &Args) -> Result<()> {
    if let Some(path) = &args.model_params {
        config.model = config_loader::load_model_params(path)?;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.unique_cb {
        config.unique_cb = true;
    }
    if let Some(nations) = &args.nations {
        config.nations = NationsConfig::List(nations.clone());
    }
    if let Some(fractions) = &args.capacity_fractions {
        config.capacity_fractions = fractions.clone();
    }
    if args.deploy_partitions.is_some() {
        config.deploy_partitions = args.deploy_partitions;
    }
    if args.subnetwork_filter.is_some() {
        config.subnetwork_filter = args.subnetwork_filter.clone();
    }
    for assignment in &args.overrides {
        config.overrides.apply_assignment(assignment)?;
    }
    config.validate().wrap_err("Invalid configuration after applying command-line arguments")?;
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Starting plasmagen");
    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => Config::default(),
    };
    apply_args(&mut config, &args)?;

    let specs = config.nation_specs()?;
    info!("Nations: {}", specs.nations().join(", "));
    let size = config.network_size(specs.nb_nations())?;
    info!(
        "Node counts: {} central banks, {} intermediaries, {} banked and {} unbanked retail users, {} merchants",
        size.central_banks, size.intermediaries, size.retail_banked, size.retail_unbanked, size.merchants
    );
    let counts = size.layer_counts(&specs, config.unique_cb)?;

    let mut catalog = payment_subnetwork_models(&counts, &config.model, &config.overrides, config.unique_cb)?;
    if let Some(kind) = config.subnetwork_kind_filter()? {
        info!("Restricting generation to subnetwork {}", kind);
        catalog.retain_kind(kind);
    }

    let (mut network, _) = generate_plasma_network(&catalog, config.seed, &specs, config.unique_cb)?;
    postprocess(&mut network, config.deploy_partitions)?;

    let copies = scale_to_fractions(&network, &config.capacity_fractions)?;
    let paths = write_scaled_networks(&copies, args.format, &args.output)?;

    info!("Generated {} networks in {:?}", paths.len(), args.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from([
            "plasmagen",
            "--nations",
            "IT,FR",
            "--capacity-fractions",
            "0.5,1.0",
            "--format",
            "gml",
            "--set",
            "i2i_k=6",
            "--set",
            "p2p_p=0.2",
        ]);
        assert_eq!(args.nations, Some(vec!["IT".to_string(), "FR".to_string()]));
        assert_eq!(args.capacity_fractions, Some(vec![0.5, 1.0]));
        assert_eq!(args.format, ExportFormat::Gml);
        assert_eq!(args.overrides.len(), 2);
        assert_eq!(args.output, PathBuf::from("plasma_output"));
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from(["plasmagen", "--nations", "IT", "--seed", "9", "--set", "i2i_k=6"]);
        let mut config = Config::default();
        apply_args(&mut config, &args).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.overrides.i2i_k(), 6);
        assert_eq!(config.nations, NationsConfig::List(vec!["IT".to_string()]));
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let args = Args::parse_from(["plasmagen", "--nations", "IT", "--set", "nope=1"]);
        assert!(apply_args(&mut Config::default(), &args).is_err());
    }
}
