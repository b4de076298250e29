//! Subnetwork model catalog.
//!
//! Builds the node groups of every layer and the descriptors of the
//! subnetworks connecting them. The catalog is plain data: nothing here draws
//! random numbers.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{ModelOverrides, ModelParams};
use crate::error::GeneratorError;
use crate::model::types::{
    AttributeModel, AttributeRule, AttributeValue, ChannelType, EdgeAttribute, EdgeKeyTemplate, LabelTemplate,
    NodeGroup, NodeType, SubnetworkKind, SubnetworkModel, TopologyModel,
};
use crate::nation::{MerchantCounts, NationCounts};
use crate::utils::amount::decode_amount;

/// Per-nation node counts of every layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCounts {
    pub central_banks: NationCounts,
    pub intermediaries: NationCounts,
    pub retail_banked: NationCounts,
    pub retail_unbanked: NationCounts,
    pub merchants: MerchantCounts,
}

impl LayerCounts {
    pub fn for_type(&self, node_type: NodeType) -> &NationCounts {
        match node_type {
            NodeType::CentralBank => &self.central_banks,
            NodeType::Intermediary => &self.intermediaries,
            NodeType::RetailBanked => &self.retail_banked,
            NodeType::RetailUnbanked => &self.retail_unbanked,
            NodeType::MerchantSmall => &self.merchants.small,
            NodeType::MerchantMedium => &self.merchants.medium,
            NodeType::MerchantLarge => &self.merchants.large,
        }
    }
}

/// Node groups per layer and the subnetwork descriptors built over them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub node_groups: BTreeMap<NodeType, NodeGroup>,
    pub subnetworks: Vec<SubnetworkModel>,
}

impl Catalog {
    pub fn subnetwork(&self, kind: SubnetworkKind) -> Option<&SubnetworkModel> {
        self.subnetworks.iter().find(|s| s.kind == kind)
    }

    /// Keep only the subnetwork of the given kind
    pub fn retain_kind(&mut self, kind: SubnetworkKind) {
        self.subnetworks.retain(|s| s.kind == kind);
    }
}

fn node_group(node_type: NodeType, counts: &LayerCounts, weight: f64, unique_cb: bool) -> NodeGroup {
    let (prefix, color, show_label) = match node_type {
        NodeType::CentralBank => ("CB", "blue", true),
        NodeType::Intermediary => ("Intermediary", "red", true),
        NodeType::RetailBanked => ("Retail", "dark green", false),
        NodeType::RetailUnbanked => ("Unbanked", "light green", false),
        NodeType::MerchantSmall => ("Merchant-small-", "yellow", false),
        NodeType::MerchantMedium => ("Merchant-medium-", "yellow", false),
        NodeType::MerchantLarge => ("Merchant-large-", "yellow", false),
    };
    let with_nation = !(node_type == NodeType::CentralBank && unique_cb);
    NodeGroup {
        node_type,
        label: LabelTemplate::new(prefix, with_nation),
        color: color.to_string(),
        weight,
        show_label,
        counts: counts.for_type(node_type).clone(),
    }
}

fn number(x: f64) -> AttributeValue {
    AttributeValue::Number(x)
}

fn fixed(label: EdgeAttribute, value: AttributeValue) -> AttributeRule {
    AttributeRule::single(label, AttributeModel::Fixed { values: vec![value] })
}

fn edge_type(kind: SubnetworkKind) -> AttributeRule {
    fixed(EdgeAttribute::Type, AttributeValue::Text(kind.edge_type().to_string()))
}

/// Zero base and rate fees on both sides
fn no_fees() -> Vec<AttributeRule> {
    let zero = || AttributeModel::Fixed {
        values: vec![number(0.0), number(0.0)],
    };
    vec![
        AttributeRule::new(vec![EdgeAttribute::SourceFeeBase, EdgeAttribute::SourceFeeRate], zero()),
        AttributeRule::new(vec![EdgeAttribute::TargetFeeBase, EdgeAttribute::TargetFeeRate], zero()),
    ]
}

/// Two equally likely `(base, rate)` fee pairs
fn discrete_fees(labels: [EdgeAttribute; 2], pairs: [(&str, &str); 2]) -> Result<AttributeRule, GeneratorError> {
    let outcomes = pairs
        .iter()
        .map(|(base, rate)| -> Result<_, GeneratorError> {
            Ok((0.5, vec![number(decode_amount(base)?), number(decode_amount(rate)?)]))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AttributeRule::new(labels.to_vec(), AttributeModel::CustomDiscrete { outcomes }))
}

/// Exponential `(base, rate)` fees rounded to 4 and 8 decimals
fn exponential_fees(labels: [EdgeAttribute; 2], base: &str, rate: &str) -> Result<AttributeRule, GeneratorError> {
    Ok(AttributeRule::new(
        labels.to_vec(),
        AttributeModel::Exponential {
            means: vec![decode_amount(base)?, decode_amount(rate)?],
            digits: vec![4, 8],
            low_cap: 0.0,
        },
    ))
}

const SOURCE_FEES: [EdgeAttribute; 2] = [EdgeAttribute::SourceFeeBase, EdgeAttribute::SourceFeeRate];
const TARGET_FEES: [EdgeAttribute; 2] = [EdgeAttribute::TargetFeeBase, EdgeAttribute::TargetFeeRate];

/// Fees charged on channels between intermediaries and their users
fn user_fees() -> Result<Vec<AttributeRule>, GeneratorError> {
    Ok(vec![
        discrete_fees(SOURCE_FEES, [("0.2cent", "0.5%"), ("0.15cent", "0.6%")])?,
        exponential_fees(TARGET_FEES, "0.2cent", "0.5%")?,
    ])
}

fn lognormal_partition(overrides: &ModelOverrides) -> TopologyModel {
    TopologyModel::BipartiteLognormalPartition {
        mean: overrides.partition_mean(),
        sigma: overrides.partition_sigma(),
    }
}

/// Assemble node groups and subnetwork descriptors.
///
/// The peer layer among citizens is only included when enabled in the model
/// parameters. Every descriptor is validated before it is returned.
pub fn payment_subnetwork_models(
    counts: &LayerCounts,
    params: &ModelParams,
    overrides: &ModelOverrides,
    unique_cb: bool,
) -> Result<Catalog, GeneratorError> {
    let layers = &params.layer_nodes;
    let weights = [
        (NodeType::CentralBank, layers.layer1.weight),
        (NodeType::Intermediary, layers.layer2.weight),
        (NodeType::RetailBanked, layers.layer3_banked.weight),
        (NodeType::RetailUnbanked, layers.layer3_unbanked.weight),
        (NodeType::MerchantSmall, layers.layer3_merchant_small.weight),
        (NodeType::MerchantMedium, layers.layer3_merchant_medium.weight),
        (NodeType::MerchantLarge, layers.layer3_merchant_large.weight),
    ];
    let node_groups: BTreeMap<NodeType, NodeGroup> = weights
        .into_iter()
        .map(|(node_type, weight)| (node_type, node_group(node_type, counts, weight, unique_cb)))
        .collect();
    let group = |node_type: NodeType| node_groups[&node_type].clone();

    let nets = &params.subnetworks;
    let mut subnetworks = Vec::new();

    // Layer 1: central banks, all connected to each other
    let kind = SubnetworkKind::CbCb;
    let mut attributes = vec![
        edge_type(kind),
        fixed(EdgeAttribute::Capacity, number(nets.cb_cb.capacity.value())),
    ];
    attributes.extend(no_fees());
    attributes.push(fixed(EdgeAttribute::IsPrivate, AttributeValue::Flag(false)));
    attributes.push(fixed(EdgeAttribute::Weight, number(nets.cb_cb.weight)));
    subnetworks.push(SubnetworkModel {
        kind,
        id: "channels_among_CBs".to_string(),
        description: "Network of channels among nodes managed by CBs".to_string(),
        channel_type: ChannelType::International,
        node_groups: vec![group(NodeType::CentralBank)],
        edge_key: EdgeKeyTemplate::new("l1.l1", false),
        topology: if unique_cb { TopologyModel::Empty } else { TopologyModel::Clique },
        bidir: true,
        attributes,
    });

    // Layer 2: small world among intermediaries
    let kind = SubnetworkKind::IntermediaryIntermediary;
    let i2i = &nets.intermediary_intermediary;
    let fee_pairs = [("0.2cent", "0.015%"), ("0.25cent", "0.01%")];
    subnetworks.push(SubnetworkModel {
        kind,
        id: "channels_among_intermediaries".to_string(),
        description: "Network of channels among nodes managed by intermediaries".to_string(),
        channel_type: ChannelType::International,
        node_groups: vec![group(NodeType::Intermediary)],
        edge_key: EdgeKeyTemplate::new("l2.l2", false),
        topology: TopologyModel::WattsStrogatz {
            k: overrides.i2i_k(),
            p: overrides.i2i_p(),
        },
        bidir: true,
        attributes: vec![
            edge_type(kind),
            fixed(EdgeAttribute::Capacity, number(i2i.capacity.value())),
            discrete_fees(SOURCE_FEES, fee_pairs)?,
            discrete_fees(TARGET_FEES, fee_pairs)?,
            fixed(EdgeAttribute::IsPrivate, AttributeValue::Flag(false)),
            AttributeRule::single(
                EdgeAttribute::Weight,
                AttributeModel::Varying {
                    national: number(i2i.weight.national),
                    international: number(i2i.weight.international),
                },
            ),
        ],
    });

    // Layers 1-2: every intermediary attached to one central bank
    let kind = SubnetworkKind::CbIntermediary;
    let mut attributes = vec![
        edge_type(kind),
        fixed(EdgeAttribute::Capacity, number(nets.cb_intermediary.capacity.value())),
    ];
    attributes.extend(no_fees());
    attributes.push(fixed(EdgeAttribute::IsPrivate, AttributeValue::Flag(false)));
    attributes.push(fixed(EdgeAttribute::Weight, number(nets.cb_intermediary.weight)));
    subnetworks.push(SubnetworkModel {
        kind,
        id: "channels_between_CBs_and_intermediaries".to_string(),
        description: "Network of channels linking CB nodes with intermediary nodes".to_string(),
        channel_type: if unique_cb { ChannelType::International } else { ChannelType::National },
        node_groups: vec![group(NodeType::CentralBank), group(NodeType::Intermediary)],
        edge_key: EdgeKeyTemplate::new("l1.l2", !unique_cb),
        topology: lognormal_partition(overrides),
        bidir: true,
        attributes,
    });

    // Layers 2-3: intermediaries serving banked citizens and merchants
    let user_layers = [
        (
            SubnetworkKind::IntermediaryRetailBanked,
            NodeType::RetailBanked,
            &nets.retail_banked,
            "channels_among_intermediaries_and_retail_users_banked",
            "Network of channels linking intermediaries and banked citizens",
            "l2.l3B",
        ),
        (
            SubnetworkKind::IntermediaryMerchantSmall,
            NodeType::MerchantSmall,
            &nets.merchant_small,
            "channels_among_intermediaries_and_retail_users_merchant_small",
            "Network of channels linking intermediaries and small merchants",
            "l2.l3Msmall",
        ),
        (
            SubnetworkKind::IntermediaryMerchantMedium,
            NodeType::MerchantMedium,
            &nets.merchant_medium,
            "channels_among_intermediaries_and_retail_users_merchant_medium",
            "Network of channels linking intermediaries and medium merchants",
            "l2.l3Mmedium",
        ),
        (
            SubnetworkKind::IntermediaryMerchantLarge,
            NodeType::MerchantLarge,
            &nets.merchant_large,
            "channels_among_intermediaries_and_retail_users_merchant_large",
            "Network of channels linking intermediaries and large merchants",
            "l2.l3Mlarge",
        ),
    ];
    for (kind, user_type, channel, id, description, key) in user_layers {
        let mut attributes = vec![
            edge_type(kind),
            fixed(EdgeAttribute::Capacity, number(channel.capacity.value())),
        ];
        attributes.extend(user_fees()?);
        attributes.push(fixed(EdgeAttribute::IsPrivate, AttributeValue::Flag(true)));
        attributes.push(fixed(EdgeAttribute::Weight, number(channel.weight)));
        subnetworks.push(SubnetworkModel {
            kind,
            id: id.to_string(),
            description: description.to_string(),
            channel_type: ChannelType::National,
            node_groups: vec![group(NodeType::Intermediary), group(user_type)],
            edge_key: EdgeKeyTemplate::new(key, true),
            topology: lognormal_partition(overrides),
            bidir: true,
            attributes,
        });
    }

    // Layer 3: optional peer-to-peer channels among citizens
    let peer = &nets.citizen_citizen;
    if peer.enabled {
        let kind = SubnetworkKind::CitizenCitizen;
        let moments = overrides.p2p_capacity(&peer.capacity);
        subnetworks.push(SubnetworkModel {
            kind,
            id: "channels_among_citizens".to_string(),
            description: "Network of P2P channels among citizens".to_string(),
            channel_type: ChannelType::National,
            node_groups: vec![group(NodeType::RetailBanked), group(NodeType::RetailUnbanked)],
            edge_key: EdgeKeyTemplate::new("l3.l3", true),
            topology: TopologyModel::WattsStrogatz {
                k: overrides.p2p_k(),
                p: overrides.p2p_p(),
            },
            bidir: false,
            attributes: vec![
                edge_type(kind),
                AttributeRule::single(
                    EdgeAttribute::Capacity,
                    AttributeModel::Beta {
                        min: moments.min.value(),
                        max: moments.max.value(),
                        mean: moments.mean.value(),
                        dev: moments.dev.value(),
                    },
                ),
                exponential_fees(SOURCE_FEES, "0.2cent", "0.02%")?,
                exponential_fees(TARGET_FEES, "0.2cent", "0.02%")?,
                fixed(EdgeAttribute::IsPrivate, AttributeValue::Flag(true)),
                fixed(EdgeAttribute::Weight, number(peer.weight)),
            ],
        });
    }

    for subnetwork in &subnetworks {
        subnetwork.validate()?;
        debug!(
            "Subnetwork {} ({}): {} over {:?}",
            subnetwork.kind,
            subnetwork.id,
            subnetwork.topology.name(),
            subnetwork.node_groups.iter().map(|g| g.node_type).collect::<Vec<_>>()
        );
    }
    info!("Assembled {} subnetwork models", subnetworks.len());

    Ok(Catalog {
        node_groups,
        subnetworks,
    })
}
