//! Network composition.
//!
//! Subnetworks are merged on their symbolic node labels: the same label in two
//! subnetworks is the same node. Merged nodes are then numbered densely in
//! order of first appearance.

use log::info;
use std::collections::HashMap;

use crate::error::GeneratorError;
use crate::model::catalog::Catalog;
use crate::model::types::{ChannelType, NodeType};
use crate::nation::NationSpecs;
use crate::network::instantiate::instantiate_subnetwork;
use crate::network::types::{Node, PlasmaNetwork, Subnetwork};

/// Merge subnetworks into one network.
///
/// Edges are keyed by `(from, to, channel_id)`; a later edge with the same key
/// replaces the earlier one. Every user with an intermediary slot is linked to
/// the intermediary opening a channel towards it.
pub fn compose(subnetworks: &[Subnetwork]) -> PlasmaNetwork {
    let mut network = PlasmaNetwork::default();
    let mut ids: HashMap<&str, usize> = HashMap::new();
    let mut edge_positions: HashMap<(usize, usize, String), usize> = HashMap::new();

    for subnetwork in subnetworks {
        let local_to_global: Vec<usize> = subnetwork
            .nodes
            .iter()
            .map(|node| {
                *ids.entry(node.label.as_str()).or_insert_with(|| {
                    let id = network.nodes.len();
                    network.nodes.push(Node {
                        id,
                        label: node.label.clone(),
                        node_type: node.node_type,
                        country: node.country.clone(),
                        intermediary: None,
                        color: node.color.clone(),
                        show_label: node.show_label,
                        weight: node.weight,
                        pre_channel_balance: None,
                        deploy_to: None,
                    });
                    id
                })
            })
            .collect();

        for edge in &subnetwork.edges {
            let mut edge = edge.clone();
            edge.from = local_to_global[edge.from];
            edge.to = local_to_global[edge.to];
            let key = (edge.from, edge.to, edge.channel_id.clone());
            match edge_positions.get(&key) {
                Some(&position) => network.edges[position] = edge,
                None => {
                    edge_positions.insert(key, network.edges.len());
                    network.edges.push(edge);
                }
            }
        }
    }

    for edge in &network.edges {
        let (from, to) = (edge.from, edge.to);
        if network.nodes[from].node_type == NodeType::Intermediary
            && network.nodes[to].node_type.has_intermediary_slot()
        {
            network.nodes[to].intermediary = Some(from);
        }
    }
    network
}

/// Generate every subnetwork of the catalog and compose them.
///
/// National models are instantiated once per nation, in name order, then
/// international models once across all nations. The instances are returned
/// alongside the composed network.
pub fn generate_plasma_network(
    catalog: &Catalog,
    seed: u64,
    nations: &NationSpecs,
    unique_cb: bool,
) -> Result<(PlasmaNetwork, Vec<Subnetwork>), GeneratorError> {
    let nation_list = nations.nations();
    let mut instances = Vec::new();

    for nation in &nation_list {
        for model in catalog
            .subnetworks
            .iter()
            .filter(|m| m.channel_type == ChannelType::National)
        {
            instances.push(instantiate_subnetwork(model, seed, std::slice::from_ref(nation), unique_cb)?);
        }
    }
    for model in catalog
        .subnetworks
        .iter()
        .filter(|m| m.channel_type == ChannelType::International)
    {
        instances.push(instantiate_subnetwork(model, seed, &nation_list, unique_cb)?);
    }

    let network = compose(&instances);
    info!(
        "Composed {} subnetworks into {} nodes and {} edges",
        instances.len(),
        network.node_count(),
        network.edge_count()
    );
    network.assert_conservation();
    Ok((network, instances))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::SubnetworkKind;
    use crate::network::types::{Edge, SubnetworkNode};

    fn node(label: &str, node_type: NodeType) -> SubnetworkNode {
        SubnetworkNode {
            label: label.to_string(),
            node_type,
            country: "IT".to_string(),
            color: "red".to_string(),
            show_label: true,
            weight: 1.0,
        }
    }

    fn channel(id: &str, from: usize, to: usize, kind: SubnetworkKind) -> Vec<Edge> {
        let mut edge = Edge::new(id, from, to, kind);
        edge.capacity = 100;
        edge.balance = 50;
        let mut back = edge.reversed();
        back.balance = 50;
        vec![edge, back]
    }

    #[test]
    fn test_shared_labels_are_merged() {
        let a = Subnetwork {
            kind: SubnetworkKind::IntermediaryIntermediary,
            id: "a".to_string(),
            nation: None,
            nodes: vec![node("IntermediaryIT1", NodeType::Intermediary), node("IntermediaryIT2", NodeType::Intermediary)],
            edges: channel("l2.l2.0", 0, 1, SubnetworkKind::IntermediaryIntermediary),
        };
        let b = Subnetwork {
            kind: SubnetworkKind::IntermediaryRetailBanked,
            id: "b".to_string(),
            nation: Some("IT".to_string()),
            nodes: vec![node("IntermediaryIT2", NodeType::Intermediary), node("RetailIT1", NodeType::RetailBanked)],
            edges: channel("l2.l3B.IT.0", 0, 1, SubnetworkKind::IntermediaryRetailBanked),
        };
        let network = compose(&[a, b]);
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.edge_count(), 4);
        assert!(network.nodes.iter().enumerate().all(|(i, n)| n.id == i));
        let retail = network.node_by_label("RetailIT1").unwrap();
        assert_eq!(retail.intermediary, Some(1));
        assert_eq!(network.node_by_label("IntermediaryIT1").unwrap().intermediary, None);
    }

    #[test]
    fn test_duplicate_edges_are_replaced() {
        let nodes = vec![node("CBIT1", NodeType::CentralBank), node("CBFR1", NodeType::CentralBank)];
        let first = Subnetwork {
            kind: SubnetworkKind::CbCb,
            id: "x".to_string(),
            nation: None,
            nodes: nodes.clone(),
            edges: channel("l1.l1.0", 0, 1, SubnetworkKind::CbCb),
        };
        let mut second = first.clone();
        second.edges[0].weight = 7.0;
        let network = compose(&[first, second]);
        assert_eq!(network.edge_count(), 2);
        assert_eq!(network.edges[0].weight, 7.0);
    }
}
