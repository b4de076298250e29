//! Generator configuration.
//!
//! A [`Config`] gathers everything a generation run needs: the seed, how
//! nations are weighted, how many nodes of each kind to create, the model
//! parameters (capacities and weights per subnetwork) and typed overrides of
//! the structural knobs.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::GeneratorError;
use crate::model::catalog::LayerCounts;
use crate::model::types::SubnetworkKind;
use crate::nation::{
    allocate, allocate_intermediaries, allocate_merchants, central_bank_counts, NationSpec, NationSpecs,
};
use crate::utils::amount::Amount;
use crate::utils::validation::{
    validate_capacity_fraction, validate_intermediary_count, validate_merchant_probabilities, validate_probability,
};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SMALL_WORLD_K: usize = 4;
pub const DEFAULT_SMALL_WORLD_P: f64 = 0.1;
pub const DEFAULT_PARTITION_MEAN: f64 = 0.0;
pub const DEFAULT_PARTITION_SIGMA: f64 = 1.0;

/// Top-level configuration of a generation run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// One central bank shared by every nation
    #[serde(default)]
    pub unique_cb: bool,
    #[serde(default)]
    pub size: SizeSpec,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub nations: NationsConfig,
    #[serde(default = "default_capacity_fractions")]
    pub capacity_fractions: Vec<f64>,
    /// Number of deployment buckets; partitioning is skipped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_partitions: Option<usize>,
    /// Restrict generation to the subnetwork with this edge type label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnetwork_filter: Option<String>,
    #[serde(default)]
    pub model: ModelParams,
    #[serde(default)]
    pub overrides: ModelOverrides,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Capacity fractions 0.0, 0.1, ..., 1.0
fn default_capacity_fractions() -> Vec<f64> {
    (0..=10).map(|i| f64::from(i) / 10.0).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            unique_cb: false,
            size: SizeSpec::default(),
            nations: NationsConfig::default(),
            capacity_fractions: default_capacity_fractions(),
            deploy_partitions: None,
            subnetwork_filter: None,
            model: ModelParams::default(),
            overrides: ModelOverrides::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), GeneratorError> {
        let specs = self.nation_specs()?;
        self.network_size(specs.nb_nations())?;
        for fraction in &self.capacity_fractions {
            validate_capacity_fraction(*fraction)?;
        }
        if self.deploy_partitions == Some(0) {
            return Err(GeneratorError::InvalidPartitionCount(0));
        }
        self.subnetwork_kind_filter()?;
        self.overrides.validate()?;
        Ok(())
    }

    pub fn nation_specs(&self) -> Result<NationSpecs, GeneratorError> {
        self.nations.resolve()
    }

    /// Resolve the node counts, with the central bank count fixed to one per
    /// nation unless a single central bank is shared.
    pub fn network_size(&self, nb_nations: usize) -> Result<NetworkSize, GeneratorError> {
        let mut size = self.size.resolve()?;
        if !self.unique_cb && size.central_banks != nb_nations {
            warn!(
                "Forcing the number of central banks to the number of nations ({} instead of {})",
                nb_nations, size.central_banks
            );
            size.central_banks = nb_nations;
        }
        size.validate(nb_nations)?;
        Ok(size)
    }

    pub fn subnetwork_kind_filter(&self) -> Result<Option<SubnetworkKind>, GeneratorError> {
        self.subnetwork_filter
            .as_deref()
            .map(|label| {
                SubnetworkKind::from_edge_type(label).ok_or_else(|| GeneratorError::UnknownSubnetwork {
                    label: label.to_string(),
                })
            })
            .transpose()
    }
}

/// How nations and their relative sizes are chosen
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NationsConfig {
    /// The Eurosystem population table
    #[default]
    Eurosystem,
    /// Nations of equal weight
    List(Vec<String>),
    /// Explicit `NAME:weight` entries
    Specs(Vec<String>),
    /// `NAME:weight` entries replacing their Eurosystem weight
    Overrides(Vec<String>),
    /// Eurosystem members, renormalised
    Subset(Vec<String>),
}

impl NationsConfig {
    pub fn resolve(&self) -> Result<NationSpecs, GeneratorError> {
        let parse_specs = |entries: &[String]| {
            entries
                .iter()
                .map(|entry| NationSpec::from_str(entry))
                .collect::<Result<Vec<_>, _>>()
        };
        match self {
            NationsConfig::Eurosystem => Ok(NationSpecs::eurosystem()),
            NationsConfig::List(names) => NationSpecs::from_nation_list(names),
            NationsConfig::Specs(entries) => NationSpecs::from_specs(parse_specs(entries)?),
            NationsConfig::Overrides(entries) => NationSpecs::eurosystem().with_overrides(&parse_specs(entries)?),
            NationsConfig::Subset(names) => NationSpecs::select_eurosystem_subset(names),
        }
    }
}

/// Node counts and ratios, any of which may be left out and inferred
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SizeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_banks: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediaries: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retail: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchants: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citizens_per_intermediary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediaries_per_cb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citizens_per_cb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchants_per_retail: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banked_retail: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unbanked_retail: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unbanked_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_small_merchants: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_medium_merchants: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_large_merchants: Option<f64>,
}

// Positions of the size parameters during inference
const NODES: usize = 0;
const CBS: usize = 1;
const INTERMEDIARIES: usize = 2;
const RETAIL: usize = 3;
const MERCHANTS: usize = 4;
const CITIZENS_PER_INTERMEDIARY: usize = 5;
const INTERMEDIARIES_PER_CB: usize = 6;
const CITIZENS_PER_CB: usize = 7;
const MERCHANTS_PER_RETAIL: usize = 8;
const BANKED: usize = 9;
const UNBANKED: usize = 10;
const UNBANKED_FRACTION: usize = 11;
const P_SMALL: usize = 12;
const P_MEDIUM: usize = 13;
const P_LARGE: usize = 14;
const SIZE_PARAMS: usize = 15;

const SIZE_PARAM_NAMES: [&str; SIZE_PARAMS] = [
    "nodes",
    "central_banks",
    "intermediaries",
    "retail",
    "merchants",
    "citizens_per_intermediary",
    "intermediaries_per_cb",
    "citizens_per_cb",
    "merchants_per_retail",
    "banked_retail",
    "unbanked_retail",
    "unbanked_fraction",
    "p_small_merchants",
    "p_medium_merchants",
    "p_large_merchants",
];

/// Value used for a parameter nothing else determines
fn size_default(param: usize) -> Option<f64> {
    match param {
        CBS => Some(1.0),
        INTERMEDIARIES_PER_CB => Some(10.0),
        UNBANKED_FRACTION => Some(0.0),
        RETAIL => Some(100_000.0),
        MERCHANTS => Some(10_000.0),
        P_SMALL => Some(0.4),
        P_MEDIUM => Some(0.3),
        P_LARGE => Some(0.3),
        _ => None,
    }
}

/// Compute `param` from the values known so far; the first dependency whose
/// inputs are all known wins.
fn infer_size_param(param: usize, v: &[Option<f64>; SIZE_PARAMS]) -> Option<f64> {
    let g = |i: usize| v[i];
    let value = match param {
        NODES => (|| Some(g(CBS)? + g(INTERMEDIARIES)? + g(RETAIL)? + g(MERCHANTS)?))(),
        CBS => (|| Some(g(NODES)? - g(INTERMEDIARIES)? - g(RETAIL)? - g(MERCHANTS)?))()
            .or_else(|| Some((g(INTERMEDIARIES)? / g(INTERMEDIARIES_PER_CB)?).trunc()))
            .or_else(|| Some((g(RETAIL)? / g(CITIZENS_PER_CB)?).trunc())),
        INTERMEDIARIES => (|| Some(g(NODES)? - g(CBS)? - g(RETAIL)? - g(MERCHANTS)?))()
            .or_else(|| Some((g(RETAIL)? / g(CITIZENS_PER_INTERMEDIARY)?).trunc()))
            .or_else(|| Some((g(CBS)? * g(INTERMEDIARIES_PER_CB)?).trunc())),
        RETAIL => (|| Some(g(NODES)? - g(CBS)? - g(INTERMEDIARIES)? - g(MERCHANTS)?))()
            .or_else(|| {
                let users = g(NODES)? - g(CBS)? - g(INTERMEDIARIES)?;
                Some(users - (users * g(MERCHANTS_PER_RETAIL)?).trunc())
            })
            .or_else(|| Some((g(INTERMEDIARIES)? * g(CITIZENS_PER_INTERMEDIARY)?).trunc()))
            .or_else(|| Some((g(CBS)? * g(CITIZENS_PER_CB)?).trunc()))
            .or_else(|| Some(g(BANKED)? + g(UNBANKED)?)),
        MERCHANTS => (|| Some(g(NODES)? - g(CBS)? - g(INTERMEDIARIES)? - g(RETAIL)?))()
            .or_else(|| Some((g(RETAIL)? * g(MERCHANTS_PER_RETAIL)?).trunc())),
        CITIZENS_PER_INTERMEDIARY => (|| Some(g(RETAIL)? / g(INTERMEDIARIES)?))(),
        INTERMEDIARIES_PER_CB => (|| Some(g(INTERMEDIARIES)? / g(CBS)?))(),
        CITIZENS_PER_CB => (|| Some(g(RETAIL)? / g(CBS)?))(),
        MERCHANTS_PER_RETAIL => (|| Some(g(MERCHANTS)? / g(RETAIL)?))(),
        BANKED => (|| Some(g(RETAIL)? - g(UNBANKED)?))(),
        UNBANKED => (|| Some(g(RETAIL)? - g(BANKED)?))()
            .or_else(|| Some((g(RETAIL)? * g(UNBANKED_FRACTION)?).round_ties_even())),
        UNBANKED_FRACTION => (|| Some(g(UNBANKED)? / g(RETAIL)?))(),
        _ => None,
    };
    value.filter(|x| x.is_finite())
}

impl SizeSpec {
    /// Node counts given as plain numbers: central banks, intermediaries,
    /// retail users and merchants.
    pub fn from_counts(central_banks: usize, intermediaries: usize, retail: usize, merchants: usize) -> Self {
        Self {
            central_banks: Some(Amount(central_banks as f64)),
            intermediaries: Some(Amount(intermediaries as f64)),
            retail: Some(Amount(retail as f64)),
            merchants: Some(Amount(merchants as f64)),
            ..Self::default()
        }
    }

    fn known_values(&self) -> [Option<f64>; SIZE_PARAMS] {
        let amount = |a: Option<Amount>| a.map(Amount::value);
        [
            amount(self.nodes),
            amount(self.central_banks),
            amount(self.intermediaries),
            amount(self.retail),
            amount(self.merchants),
            self.citizens_per_intermediary,
            self.intermediaries_per_cb,
            self.citizens_per_cb,
            self.merchants_per_retail,
            amount(self.banked_retail),
            amount(self.unbanked_retail),
            self.unbanked_fraction,
            self.p_small_merchants,
            self.p_medium_merchants,
            self.p_large_merchants,
        ]
    }

    /// Infer every missing parameter.
    ///
    /// Functional dependencies between counts and ratios are applied until no
    /// new value can be derived; defaults are then used for parameters nothing
    /// else determines, and inference resumes. Parameters that remain unknown
    /// make the specification invalid.
    pub fn resolve(&self) -> Result<NetworkSize, GeneratorError> {
        let mut values = self.known_values();
        let mut use_defaults = false;

        while values.iter().any(Option::is_none) {
            let known_before = values.iter().flatten().count();
            for param in 0..SIZE_PARAMS {
                if values[param].is_some() {
                    continue;
                }
                if let Some(value) = infer_size_param(param, &values) {
                    values[param] = Some(value);
                } else if use_defaults {
                    values[param] = size_default(param);
                }
            }
            if values.iter().flatten().count() == known_before {
                if use_defaults {
                    let missing: Vec<&str> = (0..SIZE_PARAMS)
                        .filter(|i| values[*i].is_none())
                        .map(|i| SIZE_PARAM_NAMES[i])
                        .collect();
                    return Err(GeneratorError::InvalidSize(format!(
                        "cannot infer {}",
                        missing.join(", ")
                    )));
                }
                use_defaults = true;
            }
        }
        debug!("Resolved size parameters: {:?}", values);

        let count = |param: usize| -> Result<usize, GeneratorError> {
            let value = values[param].unwrap_or_default();
            if value < 0.0 {
                return Err(GeneratorError::InvalidSize(format!(
                    "{} would be negative ({})",
                    SIZE_PARAM_NAMES[param], value
                )));
            }
            Ok(value as usize)
        };
        let size = NetworkSize {
            central_banks: count(CBS)?,
            intermediaries: count(INTERMEDIARIES)?,
            retail_banked: count(BANKED)?,
            retail_unbanked: count(UNBANKED)?,
            merchants: count(MERCHANTS)?,
            p_small_merchants: values[P_SMALL].unwrap_or_default(),
            p_medium_merchants: values[P_MEDIUM].unwrap_or_default(),
            p_large_merchants: values[P_LARGE].unwrap_or_default(),
        };
        let retail = count(RETAIL)?;
        if size.retail_banked + size.retail_unbanked != retail {
            return Err(GeneratorError::InvalidSize(format!(
                "{} banked and {} unbanked users do not add up to {} retail users",
                size.retail_banked, size.retail_unbanked, retail
            )));
        }
        Ok(size)
    }
}

/// Fully resolved node counts of a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSize {
    pub central_banks: usize,
    pub intermediaries: usize,
    pub retail_banked: usize,
    pub retail_unbanked: usize,
    pub merchants: usize,
    pub p_small_merchants: f64,
    pub p_medium_merchants: f64,
    pub p_large_merchants: f64,
}

impl NetworkSize {
    pub fn retail(&self) -> usize {
        self.retail_banked + self.retail_unbanked
    }

    pub fn total_nodes(&self) -> usize {
        self.central_banks + self.intermediaries + self.retail() + self.merchants
    }

    pub fn validate(&self, nb_nations: usize) -> Result<(), GeneratorError> {
        validate_intermediary_count(self.intermediaries, nb_nations)?;
        validate_merchant_probabilities(self.p_small_merchants, self.p_medium_merchants, self.p_large_merchants)?;
        Ok(())
    }

    /// Split every layer across nations.
    pub fn layer_counts(&self, specs: &NationSpecs, unique_cb: bool) -> Result<LayerCounts, GeneratorError> {
        Ok(LayerCounts {
            central_banks: central_bank_counts(specs, unique_cb),
            intermediaries: allocate_intermediaries(self.intermediaries, specs)?,
            retail_banked: allocate(self.retail_banked, specs),
            retail_unbanked: allocate(self.retail_unbanked, specs),
            merchants: allocate_merchants(self.merchants, self.p_medium_merchants, self.p_large_merchants, specs),
        })
    }
}

/// Model parameters: node weights per layer and capacity and weight per
/// subnetwork
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ModelParams {
    #[serde(default)]
    pub layer_nodes: LayerNodeParams,
    #[serde(default)]
    pub subnetworks: SubnetworkParams,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LayerNodeParams {
    #[serde(default)]
    pub layer1: LayerParams,
    #[serde(default)]
    pub layer2: LayerParams,
    #[serde(default, rename = "layer3B")]
    pub layer3_banked: LayerParams,
    #[serde(default, rename = "layer3U")]
    pub layer3_unbanked: LayerParams,
    #[serde(default, rename = "layer3Msmall")]
    pub layer3_merchant_small: LayerParams,
    #[serde(default, rename = "layer3Mmedium")]
    pub layer3_merchant_medium: LayerParams,
    #[serde(default, rename = "layer3Mlarge")]
    pub layer3_merchant_large: LayerParams,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LayerParams {
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for LayerParams {
    fn default() -> Self {
        Self { weight: default_weight() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubnetworkParams {
    #[serde(rename = "[1<channel>1]", default = "ChannelParams::cb_cb")]
    pub cb_cb: ChannelParams,
    #[serde(rename = "[2<channel>2]", default)]
    pub intermediary_intermediary: LocalityChannelParams,
    #[serde(rename = "[1<channel>2]", default = "ChannelParams::cb_intermediary")]
    pub cb_intermediary: ChannelParams,
    #[serde(rename = "[2<channel>3B]", default = "ChannelParams::retail_banked")]
    pub retail_banked: ChannelParams,
    #[serde(rename = "[2<channel>3Msmall]", default = "ChannelParams::merchant_small")]
    pub merchant_small: ChannelParams,
    #[serde(rename = "[2<channel>3Mmedium]", default = "ChannelParams::merchant_medium")]
    pub merchant_medium: ChannelParams,
    #[serde(rename = "[2<channel>3Mlarge]", default = "ChannelParams::merchant_large")]
    pub merchant_large: ChannelParams,
    #[serde(rename = "[3<channel>3]", default)]
    pub citizen_citizen: PeerChannelParams,
}

impl Default for SubnetworkParams {
    fn default() -> Self {
        Self {
            cb_cb: ChannelParams::cb_cb(),
            intermediary_intermediary: LocalityChannelParams::default(),
            cb_intermediary: ChannelParams::cb_intermediary(),
            retail_banked: ChannelParams::retail_banked(),
            merchant_small: ChannelParams::merchant_small(),
            merchant_medium: ChannelParams::merchant_medium(),
            merchant_large: ChannelParams::merchant_large(),
            citizen_citizen: PeerChannelParams::default(),
        }
    }
}

/// Fixed capacity and weight of the channels of one subnetwork
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ChannelParams {
    pub capacity: Amount,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl ChannelParams {
    pub fn new(capacity: f64) -> Self {
        Self {
            capacity: Amount(capacity),
            weight: default_weight(),
        }
    }

    fn cb_cb() -> Self {
        Self::new(5e6)
    }

    fn cb_intermediary() -> Self {
        Self::new(1e6)
    }

    fn retail_banked() -> Self {
        Self::new(3e5)
    }

    fn merchant_small() -> Self {
        Self::new(5e5)
    }

    fn merchant_medium() -> Self {
        Self::new(5e6)
    }

    fn merchant_large() -> Self {
        Self::new(5e7)
    }
}

/// Channel weights depending on whether both ends share a nation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LocalityWeight {
    pub national: f64,
    pub international: f64,
}

impl Default for LocalityWeight {
    fn default() -> Self {
        Self {
            national: default_weight(),
            international: default_weight(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LocalityChannelParams {
    pub capacity: Amount,
    #[serde(default)]
    pub weight: LocalityWeight,
}

impl Default for LocalityChannelParams {
    fn default() -> Self {
        Self {
            capacity: Amount(1e6),
            weight: LocalityWeight::default(),
        }
    }
}

/// Moments of a Beta law on `[min, max]`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BetaMoments {
    pub min: Amount,
    pub mean: Amount,
    pub max: Amount,
    pub dev: Amount,
}

/// Parameters of the optional peer-to-peer layer among citizens
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PeerChannelParams {
    #[serde(default)]
    pub enabled: bool,
    pub capacity: BetaMoments,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Default for PeerChannelParams {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: BetaMoments {
                min: Amount(1e3),
                mean: Amount(5e4),
                max: Amount(5e5),
                dev: Amount(3e4),
            },
            weight: default_weight(),
        }
    }
}

/// Typed overrides of the structural model knobs
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ModelOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i2i_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i2i_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2p_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2p_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_sigma: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_p2p_capacity: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_p2p_capacity: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_p2p_capacity: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_p2p_capacity: Option<Amount>,
}

impl ModelOverrides {
    pub fn i2i_k(&self) -> usize {
        self.i2i_k.unwrap_or(DEFAULT_SMALL_WORLD_K)
    }

    pub fn i2i_p(&self) -> f64 {
        self.i2i_p.unwrap_or(DEFAULT_SMALL_WORLD_P)
    }

    pub fn p2p_k(&self) -> usize {
        self.p2p_k.unwrap_or(DEFAULT_SMALL_WORLD_K)
    }

    pub fn p2p_p(&self) -> f64 {
        self.p2p_p.unwrap_or(DEFAULT_SMALL_WORLD_P)
    }

    pub fn partition_mean(&self) -> f64 {
        self.partition_mean.unwrap_or(DEFAULT_PARTITION_MEAN)
    }

    pub fn partition_sigma(&self) -> f64 {
        self.partition_sigma.unwrap_or(DEFAULT_PARTITION_SIGMA)
    }

    /// Peer-layer capacity moments after applying the overrides
    pub fn p2p_capacity(&self, base: &BetaMoments) -> BetaMoments {
        BetaMoments {
            min: self.min_p2p_capacity.unwrap_or(base.min),
            mean: self.mean_p2p_capacity.unwrap_or(base.mean),
            max: self.max_p2p_capacity.unwrap_or(base.max),
            dev: self.dev_p2p_capacity.unwrap_or(base.dev),
        }
    }

    pub fn validate(&self) -> Result<(), GeneratorError> {
        validate_probability("i2i_p", self.i2i_p())?;
        validate_probability("p2p_p", self.p2p_p())?;
        Ok(())
    }

    /// Apply a `name=value` assignment, e.g. `i2i_k=6` or `max_p2p_capacity=1M`.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), GeneratorError> {
        let invalid = |reason: &str| GeneratorError::InvalidOverride {
            assignment: assignment.to_string(),
            reason: reason.to_string(),
        };
        let (name, value) = assignment.split_once('=').ok_or_else(|| invalid("expected name=value"))?;
        let value = value.trim();
        let integer = || value.parse::<usize>().map_err(|_| invalid("expected an integer"));
        let float = || value.parse::<f64>().map_err(|_| invalid("expected a number"));
        let amount = || value.parse::<Amount>().map_err(|_| invalid("expected an amount"));
        match name.trim() {
            "i2i_k" => self.i2i_k = Some(integer()?),
            "i2i_p" => self.i2i_p = Some(float()?),
            "p2p_k" => self.p2p_k = Some(integer()?),
            "p2p_p" => self.p2p_p = Some(float()?),
            "partition_mean" => self.partition_mean = Some(float()?),
            "partition_sigma" => self.partition_sigma = Some(float()?),
            "min_p2p_capacity" => self.min_p2p_capacity = Some(amount()?),
            "mean_p2p_capacity" => self.mean_p2p_capacity = Some(amount()?),
            "max_p2p_capacity" => self.max_p2p_capacity = Some(amount()?),
            "dev_p2p_capacity" => self.dev_p2p_capacity = Some(amount()?),
            _ => return Err(invalid("unknown parameter")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_defaults() {
        let size = SizeSpec::default().resolve().unwrap();
        assert_eq!(size.central_banks, 1);
        assert_eq!(size.intermediaries, 10);
        assert_eq!(size.retail_banked, 100_000);
        assert_eq!(size.retail_unbanked, 0);
        assert_eq!(size.merchants, 10_000);
        assert_eq!(size.p_small_merchants, 0.4);
    }

    #[test]
    fn test_size_from_counts() {
        let size = SizeSpec::from_counts(2, 30, 3000, 300).resolve().unwrap();
        assert_eq!(size.central_banks, 2);
        assert_eq!(size.intermediaries, 30);
        assert_eq!(size.retail(), 3000);
        assert_eq!(size.merchants, 300);
        assert_eq!(size.total_nodes(), 3332);
    }

    #[test]
    fn test_size_from_ratios() {
        let spec = SizeSpec {
            nodes: Some(Amount(1111.0)),
            central_banks: Some(Amount(1.0)),
            intermediaries: Some(Amount(10.0)),
            merchants_per_retail: Some(0.1),
            unbanked_fraction: Some(0.2),
            ..SizeSpec::default()
        };
        let size = spec.resolve().unwrap();
        assert_eq!(size.retail() + size.merchants, 1100);
        assert_eq!(size.retail(), 990);
        assert_eq!(size.merchants, 110);
        assert_eq!(size.retail_unbanked, 198);
        assert_eq!(size.retail_banked, 792);
    }

    #[test]
    fn test_inconsistent_size_is_rejected() {
        let spec = SizeSpec {
            nodes: Some(Amount(10.0)),
            central_banks: Some(Amount(1.0)),
            intermediaries: Some(Amount(10.0)),
            retail: Some(Amount(100.0)),
            ..SizeSpec::default()
        };
        assert!(matches!(spec.resolve(), Err(GeneratorError::InvalidSize(_))));
    }

    #[test]
    fn test_central_banks_forced_to_nation_count() {
        let config = Config {
            size: SizeSpec::from_counts(1, 10, 100, 10),
            nations: NationsConfig::List(vec!["IT".into(), "FR".into(), "DE".into()]),
            ..Config::default()
        };
        let specs = config.nation_specs().unwrap();
        assert_eq!(config.network_size(specs.nb_nations()).unwrap().central_banks, 3);

        let shared = Config { unique_cb: true, ..config };
        assert_eq!(shared.network_size(3).unwrap().central_banks, 1);
    }

    #[test]
    fn test_too_few_intermediaries() {
        let config = Config {
            size: SizeSpec::from_counts(1, 2, 100, 10),
            nations: NationsConfig::List(vec!["IT".into(), "FR".into(), "DE".into()]),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GeneratorError::TooFewIntermediaries { intermediaries: 2, nations: 3 })
        ));
    }

    #[test]
    fn test_nations_config_variants() {
        let specs = NationsConfig::Specs(vec!["IT:0.6".into(), "FR:0.4".into()]).resolve().unwrap();
        assert_eq!(specs.nations(), vec!["FR".to_string(), "IT".to_string()]);
        assert!(NationsConfig::Specs(vec!["IT:0.6".into()]).resolve().is_err());
        assert_eq!(NationsConfig::Eurosystem.resolve().unwrap().nb_nations(), 20);
        let subset = NationsConfig::Subset(vec!["IT".into(), "FR".into()]).resolve().unwrap();
        assert!((subset.total_relative_size() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_overrides_assignment() {
        let mut overrides = ModelOverrides::default();
        assert_eq!(overrides.i2i_k(), 4);
        overrides.apply_assignment("i2i_k=6").unwrap();
        overrides.apply_assignment("max_p2p_capacity=1M").unwrap();
        assert_eq!(overrides.i2i_k(), 6);
        assert_eq!(overrides.max_p2p_capacity, Some(Amount(1e6)));
        assert!(overrides.apply_assignment("bogus=1").is_err());
        assert!(overrides.apply_assignment("i2i_k").is_err());
        assert!(overrides.apply_assignment("i2i_k=x").is_err());
    }

    #[test]
    fn test_model_params_from_json() {
        let json = r#"{
            "layer_nodes": {"layer1": {"weight": 5}, "layer3B": {"weight": 0.5}},
            "subnetworks": {
                "[1<channel>1]": {"capacity": "5M"},
                "[2<channel>2]": {"capacity": "1M", "weight": {"national": 1, "international": 3}},
                "[3<channel>3]": {"enabled": true, "capacity": {"min": "1k", "mean": "50k", "max": "500k", "dev": "30k"}}
            }
        }"#;
        let params: ModelParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.layer_nodes.layer1.weight, 5.0);
        assert_eq!(params.layer_nodes.layer2.weight, 1.0);
        assert_eq!(params.subnetworks.intermediary_intermediary.weight.international, 3.0);
        assert!(params.subnetworks.citizen_citizen.enabled);
        assert_eq!(params.subnetworks.merchant_large.capacity, Amount(5e7));
    }

    #[test]
    fn test_unknown_subnetwork_filter() {
        let config = Config {
            nations: NationsConfig::List(vec!["IT".into(), "FR".into(), "DE".into()]),
            size: SizeSpec::from_counts(3, 12, 600, 60),
            subnetwork_filter: Some("9<>9".to_string()),
            ..Config::default()
        };
        match config.validate() {
            Err(GeneratorError::UnknownSubnetwork { label }) => assert_eq!(label, "9<>9"),
            other => panic!("expected an unknown subnetwork error, got {:?}", other),
        }
    }
}
