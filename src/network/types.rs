//! Node, edge and network types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::types::{NodeType, SubnetworkKind};

/// Routing fee charged on one side of a channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub base: f64,
    pub rate: f64,
}

/// One direction of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub channel_id: String,
    pub from: usize,
    pub to: usize,
    pub capacity: u64,
    pub balance: u64,
    pub source_fee: FeeSchedule,
    pub target_fee: FeeSchedule,
    pub is_private: bool,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub weight: f64,
}

impl Edge {
    pub fn new(channel_id: impl Into<String>, from: usize, to: usize, kind: SubnetworkKind) -> Self {
        Self {
            channel_id: channel_id.into(),
            from,
            to,
            capacity: 0,
            balance: 0,
            source_fee: FeeSchedule::default(),
            target_fee: FeeSchedule::default(),
            is_private: false,
            edge_type: kind.edge_type().to_string(),
            weight: 1.0,
        }
    }

    /// Same channel seen from the other endpoint
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            balance: 0,
            ..self.clone()
        }
    }

    pub fn kind(&self) -> Option<SubnetworkKind> {
        SubnetworkKind::from_edge_type(&self.edge_type)
    }

    /// Key identifying the edge inside a network
    pub fn key(&self) -> (usize, usize, &str) {
        (self.from, self.to, self.channel_id.as_str())
    }
}

/// Node of a single subnetwork, identified by its symbolic label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetworkNode {
    pub label: String,
    pub node_type: NodeType,
    pub country: String,
    pub color: String,
    pub show_label: bool,
    pub weight: f64,
}

/// One instantiated subnetwork. Edge endpoints index into `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subnetwork {
    pub kind: SubnetworkKind,
    pub id: String,
    /// Nation the subnetwork was built for, `None` for international ones
    pub nation: Option<String>,
    pub nodes: Vec<SubnetworkNode>,
    pub edges: Vec<Edge>,
}

/// Node of the composed network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: usize,
    pub label: String,
    pub node_type: NodeType,
    pub country: String,
    /// Id of the intermediary serving this user, if any
    pub intermediary: Option<usize>,
    pub color: String,
    pub show_label: bool,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_channel_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_to: Option<String>,
}

/// The composed directed multigraph of all subnetworks.
///
/// Nodes are densely numbered and `nodes[i].id == i`; every channel appears
/// as two edges sharing one channel id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlasmaNetwork {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl PlasmaNetwork {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_by_label(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label == label)
    }

    /// Edges grouped by channel id
    pub fn channels(&self) -> BTreeMap<&str, Vec<&Edge>> {
        let mut channels: BTreeMap<&str, Vec<&Edge>> = BTreeMap::new();
        for edge in &self.edges {
            channels.entry(edge.channel_id.as_str()).or_default().push(edge);
        }
        channels
    }

    pub fn count_by_type(&self) -> BTreeMap<NodeType, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.node_type).or_insert(0) += 1;
        }
        counts
    }

    /// Panics if any channel has directions with different capacities or
    /// balances not adding up to its capacity.
    pub fn assert_conservation(&self) {
        for (channel_id, edges) in self.channels() {
            assert_eq!(edges.len(), 2, "channel {} does not have exactly two directions", channel_id);
            let capacity = edges[0].capacity;
            assert_eq!(edges[1].capacity, capacity, "capacity mismatch in channel {}", channel_id);
            assert_eq!(
                edges[0].balance + edges[1].balance,
                capacity,
                "balances of channel {} do not add up to its capacity",
                channel_id
            );
        }
    }
}
