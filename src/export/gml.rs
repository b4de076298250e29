//! GML writer.

use crate::network::types::{Edge, Node, PlasmaNetwork};

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "'"))
}

fn push_node(gml: &mut String, node: &Node) {
    gml.push_str("  node [\n");
    gml.push_str(&format!("    id {}\n", node.id));
    gml.push_str(&format!("    label {}\n", quoted(&node.label)));
    gml.push_str(&format!("    type {}\n", quoted(node.node_type.description())));
    gml.push_str(&format!("    country {}\n", quoted(&node.country)));
    gml.push_str(&format!("    color {}\n", quoted(&node.color)));
    gml.push_str(&format!("    show_label {}\n", u8::from(node.show_label)));
    gml.push_str(&format!("    weight {}\n", node.weight));
    if let Some(intermediary) = node.intermediary {
        gml.push_str(&format!("    intermediary {}\n", intermediary));
    }
    if let Some(balance) = node.pre_channel_balance {
        gml.push_str(&format!("    pre_channel_balance {}\n", balance));
    }
    if let Some(bucket) = &node.deploy_to {
        gml.push_str(&format!("    deploy_to {}\n", quoted(bucket)));
    }
    gml.push_str("  ]\n");
}

fn push_edge(gml: &mut String, edge: &Edge) {
    gml.push_str("  edge [\n");
    gml.push_str(&format!("    source {}\n", edge.from));
    gml.push_str(&format!("    target {}\n", edge.to));
    gml.push_str(&format!("    key {}\n", quoted(&edge.channel_id)));
    gml.push_str(&format!("    type {}\n", quoted(&edge.edge_type)));
    gml.push_str(&format!("    capacity {}\n", edge.capacity));
    gml.push_str(&format!("    balance {}\n", edge.balance));
    gml.push_str(&format!("    source_fee_base {}\n", edge.source_fee.base));
    gml.push_str(&format!("    source_fee_rate {}\n", edge.source_fee.rate));
    gml.push_str(&format!("    target_fee_base {}\n", edge.target_fee.base));
    gml.push_str(&format!("    target_fee_rate {}\n", edge.target_fee.rate));
    gml.push_str(&format!("    is_private {}\n", u8::from(edge.is_private)));
    gml.push_str(&format!("    weight {}\n", edge.weight));
    gml.push_str("  ]\n");
}

/// Render a network as a directed multigraph in GML
pub fn to_gml(network: &PlasmaNetwork) -> String {
    let mut gml = String::new();
    gml.push_str("graph [\n");
    gml.push_str("  directed 1\n");
    gml.push_str("  multigraph 1\n");
    for node in &network.nodes {
        push_node(&mut gml, node);
    }
    for edge in &network.edges {
        push_edge(&mut gml, edge);
    }
    gml.push_str("]\n");
    gml
}
