//! Balance assignment.
//!
//! Splits the capacity of every channel between its two directions so that
//! `balance(u->v) + balance(v->u) == capacity` holds exactly.

use crate::model::types::NodeType;
use crate::network::types::{Edge, SubnetworkNode};

/// Balance of the forward direction of a channel.
///
/// Funded both ways, an intermediary keeps 90% of a channel with one of its
/// users and the user 10%; any other pair splits the capacity evenly. A
/// channel funded one way only puts the whole capacity on the opener's side.
pub fn forward_balance(capacity: u64, from: NodeType, to: NodeType, bidir: bool) -> u64 {
    if !bidir {
        return capacity;
    }
    let capacity = u128::from(capacity);
    let balance = if from == NodeType::Intermediary && to.is_user() {
        capacity * 9 / 10
    } else if from.is_user() && to == NodeType::Intermediary {
        capacity / 10
    } else {
        capacity / 2
    };
    balance as u64
}

/// Assign balances to matching forward and reverse edges.
///
/// `reverse[i]` must be the opposite direction of `forward[i]`.
pub fn assign_balances(forward: &mut [Edge], reverse: &mut [Edge], nodes: &[SubnetworkNode], bidir: bool) {
    assert_eq!(forward.len(), reverse.len(), "every channel needs both directions");
    for (edge, back) in forward.iter_mut().zip(reverse.iter_mut()) {
        assert_eq!(
            edge.capacity, back.capacity,
            "capacity mismatch in channel {}",
            edge.channel_id
        );
        assert!(edge.from == back.to && edge.to == back.from && edge.channel_id == back.channel_id);

        let balance = forward_balance(edge.capacity, nodes[edge.from].node_type, nodes[edge.to].node_type, bidir);
        edge.balance = balance;
        back.balance = edge.capacity - balance;
        assert_eq!(edge.balance + back.balance, edge.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::SubnetworkKind;

    fn node(node_type: NodeType) -> SubnetworkNode {
        SubnetworkNode {
            label: format!("{:?}", node_type),
            node_type,
            country: "IT".to_string(),
            color: "red".to_string(),
            show_label: false,
            weight: 1.0,
        }
    }

    #[test]
    fn test_intermediary_keeps_ninety_percent() {
        assert_eq!(forward_balance(1000, NodeType::Intermediary, NodeType::RetailBanked, true), 900);
        assert_eq!(forward_balance(1000, NodeType::Intermediary, NodeType::MerchantLarge, true), 900);
        assert_eq!(forward_balance(1000, NodeType::RetailBanked, NodeType::Intermediary, true), 100);
    }

    #[test]
    fn test_even_split_and_unidirectional() {
        assert_eq!(forward_balance(1001, NodeType::CentralBank, NodeType::Intermediary, true), 500);
        assert_eq!(forward_balance(1000, NodeType::Intermediary, NodeType::Intermediary, true), 500);
        assert_eq!(forward_balance(1000, NodeType::RetailBanked, NodeType::RetailUnbanked, false), 1000);
    }

    #[test]
    fn test_assign_balances_conserves_capacity() {
        let nodes = vec![node(NodeType::Intermediary), node(NodeType::RetailBanked)];
        let mut edge = Edge::new("l2.l3B.IT.0", 0, 1, SubnetworkKind::IntermediaryRetailBanked);
        edge.capacity = 1000;
        let mut forward = vec![edge];
        let mut reverse: Vec<Edge> = forward.iter().map(Edge::reversed).collect();
        assign_balances(&mut forward, &mut reverse, &nodes, true);
        assert_eq!(forward[0].balance, 900);
        assert_eq!(reverse[0].balance, 100);

        let nodes = vec![node(NodeType::RetailBanked), node(NodeType::RetailUnbanked)];
        let mut edge = Edge::new("l3.l3.IT.0", 0, 1, SubnetworkKind::CitizenCitizen);
        edge.capacity = 1000;
        let mut forward = vec![edge];
        let mut reverse: Vec<Edge> = forward.iter().map(Edge::reversed).collect();
        assign_balances(&mut forward, &mut reverse, &nodes, false);
        assert_eq!(forward[0].balance, 1000);
        assert_eq!(reverse[0].balance, 0);
    }

    #[test]
    #[should_panic(expected = "capacity mismatch")]
    fn test_capacity_mismatch_panics() {
        let nodes = vec![node(NodeType::CentralBank), node(NodeType::CentralBank)];
        let mut edge = Edge::new("l1.l1.0", 0, 1, SubnetworkKind::CbCb);
        edge.capacity = 10;
        let mut reverse = vec![edge.reversed()];
        reverse[0].capacity = 11;
        assign_balances(&mut [edge], &mut reverse, &nodes, true);
    }
}
