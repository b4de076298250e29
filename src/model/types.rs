//! Model type definitions.
//!
//! This file contains the node, channel and subnetwork vocabulary of the
//! generator, and the declarative descriptors ([`SubnetworkModel`],
//! [`TopologyModel`], [`AttributeModel`]) that the catalog assembles and the
//! instantiator interprets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GeneratorError;
use crate::nation::NationCounts;
use crate::rnd::distributions::beta_shape_parameters;
use crate::utils::validation::{sums_to_unity, validate_probability};

/// Kind of participant in the payment network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeType {
    CentralBank,
    Intermediary,
    RetailBanked,
    RetailUnbanked,
    MerchantSmall,
    MerchantMedium,
    MerchantLarge,
}

impl NodeType {
    pub const ALL: [NodeType; 7] = [
        NodeType::CentralBank,
        NodeType::Intermediary,
        NodeType::RetailBanked,
        NodeType::RetailUnbanked,
        NodeType::MerchantSmall,
        NodeType::MerchantMedium,
        NodeType::MerchantLarge,
    ];

    pub fn is_retail(self) -> bool {
        matches!(self, NodeType::RetailBanked | NodeType::RetailUnbanked)
    }

    pub fn is_merchant(self) -> bool {
        matches!(
            self,
            NodeType::MerchantSmall | NodeType::MerchantMedium | NodeType::MerchantLarge
        )
    }

    /// Retail users and merchants
    pub fn is_user(self) -> bool {
        self.is_retail() || self.is_merchant()
    }

    /// Whether nodes of this type record the intermediary that serves them.
    ///
    /// Unbanked users have no intermediary.
    pub fn has_intermediary_slot(self) -> bool {
        self.is_user() && self != NodeType::RetailUnbanked
    }

    /// Human-readable description, as written to exported graphs
    pub fn description(self) -> &'static str {
        match self {
            NodeType::CentralBank => "Central Bank node",
            NodeType::Intermediary => "Intermediary node",
            NodeType::RetailBanked => "Retail node (banked)",
            NodeType::RetailUnbanked => "Retail node (unbanked)",
            NodeType::MerchantSmall => "Merchant small",
            NodeType::MerchantMedium => "Merchant medium",
            NodeType::MerchantLarge => "Merchant large",
        }
    }

    /// Key of the node layer in model parameters
    pub fn layer_key(self) -> &'static str {
        match self {
            NodeType::CentralBank => "layer1",
            NodeType::Intermediary => "layer2",
            NodeType::RetailBanked => "layer3B",
            NodeType::RetailUnbanked => "layer3U",
            NodeType::MerchantSmall => "layer3Msmall",
            NodeType::MerchantMedium => "layer3Mmedium",
            NodeType::MerchantLarge => "layer3Mlarge",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Whether a subnetwork is built once per nation or once across all nations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    National,
    International,
}

/// The closed set of structural layer pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubnetworkKind {
    CbCb,
    IntermediaryIntermediary,
    CbIntermediary,
    IntermediaryRetailBanked,
    IntermediaryMerchantSmall,
    IntermediaryMerchantMedium,
    IntermediaryMerchantLarge,
    CitizenCitizen,
}

impl SubnetworkKind {
    pub const ALL: [SubnetworkKind; 8] = [
        SubnetworkKind::CbCb,
        SubnetworkKind::IntermediaryIntermediary,
        SubnetworkKind::CbIntermediary,
        SubnetworkKind::IntermediaryRetailBanked,
        SubnetworkKind::IntermediaryMerchantSmall,
        SubnetworkKind::IntermediaryMerchantMedium,
        SubnetworkKind::IntermediaryMerchantLarge,
        SubnetworkKind::CitizenCitizen,
    ];

    /// Key of the subnetwork in model parameters
    pub fn key(self) -> &'static str {
        match self {
            SubnetworkKind::CbCb => "[1<channel>1]",
            SubnetworkKind::IntermediaryIntermediary => "[2<channel>2]",
            SubnetworkKind::CbIntermediary => "[1<channel>2]",
            SubnetworkKind::IntermediaryRetailBanked => "[2<channel>3B]",
            SubnetworkKind::IntermediaryMerchantSmall => "[2<channel>3Msmall]",
            SubnetworkKind::IntermediaryMerchantMedium => "[2<channel>3Mmedium]",
            SubnetworkKind::IntermediaryMerchantLarge => "[2<channel>3Mlarge]",
            SubnetworkKind::CitizenCitizen => "[3<channel>3]",
        }
    }

    /// Edge type label carried by every edge of the subnetwork
    pub fn edge_type(self) -> &'static str {
        match self {
            SubnetworkKind::CbCb => "1<>1",
            SubnetworkKind::IntermediaryIntermediary => "2<>2",
            SubnetworkKind::CbIntermediary => "1<>2",
            SubnetworkKind::IntermediaryRetailBanked => "2<>3B",
            SubnetworkKind::IntermediaryMerchantSmall => "2<>3Msmall",
            SubnetworkKind::IntermediaryMerchantMedium => "2<>3Mmedium",
            SubnetworkKind::IntermediaryMerchantLarge => "2<>3Mlarge",
            SubnetworkKind::CitizenCitizen => "3<>3",
        }
    }

    pub fn from_edge_type(label: &str) -> Option<SubnetworkKind> {
        Self::ALL.into_iter().find(|k| k.edge_type() == label)
    }

    /// Subnetworks whose channels keep their capacity when a network is
    /// rescaled to a capacity fraction.
    pub fn is_capacity_exempt(self) -> bool {
        matches!(
            self,
            SubnetworkKind::CbCb
                | SubnetworkKind::IntermediaryMerchantSmall
                | SubnetworkKind::IntermediaryMerchantMedium
                | SubnetworkKind::IntermediaryMerchantLarge
                | SubnetworkKind::CitizenCitizen
        )
    }
}

impl fmt::Display for SubnetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Template for symbolic node labels, e.g. `Intermediary{nation}{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTemplate {
    pub prefix: String,
    pub with_nation: bool,
}

impl LabelTemplate {
    pub fn new(prefix: impl Into<String>, with_nation: bool) -> Self {
        Self {
            prefix: prefix.into(),
            with_nation,
        }
    }

    /// Render the label of the `id`-th node (1-based) of `nation`
    pub fn render(&self, nation: &str, id: usize) -> String {
        if self.with_nation {
            format!("{}{}{}", self.prefix, nation, id)
        } else {
            format!("{}{}", self.prefix, id)
        }
    }
}

/// Template for channel ids, e.g. `l2.l3B.IT.17`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeKeyTemplate {
    pub prefix: String,
    pub per_nation: bool,
}

impl EdgeKeyTemplate {
    pub fn new(prefix: impl Into<String>, per_nation: bool) -> Self {
        Self {
            prefix: prefix.into(),
            per_nation,
        }
    }

    /// Render the id of the `id`-th channel. The nation is only included for
    /// per-nation templates instantiated for a single nation.
    pub fn render(&self, nation: Option<&str>, id: usize) -> String {
        match (self.per_nation, nation) {
            (true, Some(nation)) => format!("{}.{}.{}", self.prefix, nation, id),
            _ => format!("{}.{}", self.prefix, id),
        }
    }
}

/// A group of nodes of one type, with per-nation counts and display attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub node_type: NodeType,
    pub label: LabelTemplate,
    pub color: String,
    pub weight: f64,
    pub show_label: bool,
    pub counts: NationCounts,
}

impl NodeGroup {
    pub fn count_for(&self, nation: &str) -> Result<usize, GeneratorError> {
        self.counts
            .get(nation)
            .copied()
            .ok_or_else(|| GeneratorError::UnknownNation {
                name: nation.to_string(),
            })
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Random graph model used to draw the channels of a subnetwork
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum TopologyModel {
    /// No channels at all
    Empty,
    /// A channel between every pair of nodes
    Clique,
    /// Small-world ring lattice of degree `k` with rewiring probability `p`
    WattsStrogatz { k: usize, p: f64 },
    /// Every pair of nodes connected with probability `p`
    ErdosRenyi { p: f64 },
    /// Every "down" node attached to exactly one "up" node, group sizes
    /// following a lognormal law
    BipartiteLognormalPartition { mean: f64, sigma: f64 },
    /// Every (up, down) pair connected with probability `p`
    BipartiteErdosRenyi { p: f64 },
}

impl TopologyModel {
    pub fn name(&self) -> &'static str {
        match self {
            TopologyModel::Empty => "empty",
            TopologyModel::Clique => "clique",
            TopologyModel::WattsStrogatz { .. } => "watts_strogatz",
            TopologyModel::ErdosRenyi { .. } => "erdos_renyi",
            TopologyModel::BipartiteLognormalPartition { .. } => "bipartite_lognormal_partition",
            TopologyModel::BipartiteErdosRenyi { .. } => "bipartite_erdos_renyi",
        }
    }

    /// Whether the model connects two distinct node sets
    pub fn is_bipartite(&self) -> bool {
        matches!(
            self,
            TopologyModel::BipartiteLognormalPartition { .. } | TopologyModel::BipartiteErdosRenyi { .. }
        )
    }

    pub fn validate(&self) -> Result<(), GeneratorError> {
        match self {
            TopologyModel::WattsStrogatz { p, .. } => validate_probability("p", *p).map(|_| ()),
            TopologyModel::ErdosRenyi { p } | TopologyModel::BipartiteErdosRenyi { p } => {
                validate_probability("p", *p).map(|_| ())
            }
            TopologyModel::BipartiteLognormalPartition { mean, sigma } => {
                if !mean.is_finite() || !sigma.is_finite() || *sigma < 0.0 {
                    return Err(GeneratorError::InvalidDistribution(format!(
                        "lognormal partition needs a finite mean and a non-negative sigma, got mean={}, sigma={}",
                        mean, sigma
                    )));
                }
                Ok(())
            }
            TopologyModel::Empty | TopologyModel::Clique => Ok(()),
        }
    }
}

/// Edge attribute that an attribute generator may assign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeAttribute {
    Type,
    Capacity,
    SourceFeeBase,
    SourceFeeRate,
    TargetFeeBase,
    TargetFeeRate,
    IsPrivate,
    Weight,
}

impl EdgeAttribute {
    pub fn name(self) -> &'static str {
        match self {
            EdgeAttribute::Type => "type",
            EdgeAttribute::Capacity => "capacity",
            EdgeAttribute::SourceFeeBase => "routing_fee_source_base",
            EdgeAttribute::SourceFeeRate => "routing_fee_source_rate",
            EdgeAttribute::TargetFeeBase => "routing_fee_target_base",
            EdgeAttribute::TargetFeeRate => "routing_fee_target_rate",
            EdgeAttribute::IsPrivate => "is_private",
            EdgeAttribute::Weight => "weight",
        }
    }
}

/// A literal attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Flag(b) => write!(f, "{}", b),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Generator of per-edge attribute values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "generator", rename_all = "snake_case")]
pub enum AttributeModel {
    /// The same values on every edge, one per label
    Fixed { values: Vec<AttributeValue> },
    /// One value for channels within a nation, another across nations
    Varying {
        national: AttributeValue,
        international: AttributeValue,
    },
    /// Cent-rounded uniform samples between `min` and `max`
    Uniform { min: f64, max: f64 },
    /// Exponential samples, one mean and one rounding precision per label,
    /// floored at `low_cap`
    Exponential {
        means: Vec<f64>,
        digits: Vec<u32>,
        low_cap: f64,
    },
    /// Beta law rescaled to `[min, max]` with the given mean and deviation
    Beta { min: f64, max: f64, mean: f64, dev: f64 },
    /// Tuples of values drawn from an explicit joint distribution
    CustomDiscrete { outcomes: Vec<(f64, Vec<AttributeValue>)> },
}

impl AttributeModel {
    pub fn name(&self) -> &'static str {
        match self {
            AttributeModel::Fixed { .. } => "fixed",
            AttributeModel::Varying { .. } => "varying",
            AttributeModel::Uniform { .. } => "uniform",
            AttributeModel::Exponential { .. } => "exponential",
            AttributeModel::Beta { .. } => "beta",
            AttributeModel::CustomDiscrete { .. } => "custom_discrete",
        }
    }
}

/// Assignment of one generator to one or more edge attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRule {
    pub labels: Vec<EdgeAttribute>,
    pub model: AttributeModel,
}

impl AttributeRule {
    pub fn new(labels: Vec<EdgeAttribute>, model: AttributeModel) -> Self {
        Self { labels, model }
    }

    pub fn single(label: EdgeAttribute, model: AttributeModel) -> Self {
        Self::new(vec![label], model)
    }

    /// Whether this rule draws channel capacities
    pub fn sets_capacity(&self) -> bool {
        self.labels.contains(&EdgeAttribute::Capacity)
    }

    /// Check that the generator parameters are usable for these labels.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        let arity = self.labels.len();
        match &self.model {
            AttributeModel::Fixed { values } => {
                if values.len() != arity {
                    return Err(GeneratorError::AttributeArity {
                        expected: arity,
                        got: values.len(),
                    });
                }
            }
            AttributeModel::Varying { .. } | AttributeModel::Beta { .. } | AttributeModel::Uniform { .. } => {
                if arity != 1 {
                    return Err(GeneratorError::AttributeArity { expected: 1, got: arity });
                }
            }
            AttributeModel::Exponential { means, digits, low_cap } => {
                if means.len() != arity || digits.len() != arity {
                    return Err(GeneratorError::AttributeArity {
                        expected: arity,
                        got: means.len().min(digits.len()),
                    });
                }
                if means.iter().chain(std::iter::once(low_cap)).any(|m| !m.is_finite() || *m < 0.0) {
                    return Err(GeneratorError::InvalidDistribution(format!(
                        "exponential means and low cap must be non-negative, got {:?} and {}",
                        means, low_cap
                    )));
                }
            }
            AttributeModel::CustomDiscrete { outcomes } => {
                if outcomes.is_empty() {
                    return Err(GeneratorError::InvalidDiscreteDistribution(
                        "no outcomes".to_string(),
                    ));
                }
                for (p, values) in outcomes {
                    validate_probability("outcome probability", *p)?;
                    if values.len() != arity {
                        return Err(GeneratorError::AttributeArity {
                            expected: arity,
                            got: values.len(),
                        });
                    }
                }
                let sum: f64 = outcomes.iter().map(|(p, _)| p).sum();
                if !sums_to_unity(sum) {
                    return Err(GeneratorError::InvalidDiscreteDistribution(format!(
                        "probabilities sum to {} instead of 1",
                        sum
                    )));
                }
            }
        }
        if let AttributeModel::Beta { min, max, mean, dev } = &self.model {
            beta_shape_parameters(*min, *max, *mean, *dev)?;
        }
        if let AttributeModel::Uniform { min, max } = &self.model {
            if !(min <= max) {
                return Err(GeneratorError::InvalidDistribution(format!(
                    "uniform range [{}, {}] is empty",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

/// Declarative description of one subnetwork (one structural layer pair)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetworkModel {
    pub kind: SubnetworkKind,
    pub id: String,
    pub description: String,
    pub channel_type: ChannelType,
    /// One group for same-layer models, up then down groups for bipartite ones
    pub node_groups: Vec<NodeGroup>,
    pub edge_key: EdgeKeyTemplate,
    pub topology: TopologyModel,
    /// Whether both sides of every channel are funded
    pub bidir: bool,
    pub attributes: Vec<AttributeRule>,
}

impl SubnetworkModel {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        self.topology.validate()?;
        for rule in &self.attributes {
            rule.validate()?;
        }
        Ok(())
    }

    pub fn edge_type(&self) -> &'static str {
        self.kind.edge_type()
    }
}
