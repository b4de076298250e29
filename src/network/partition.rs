//! Deployment partitioning.
//!
//! Greedy approximation of a balanced k-way cut, used to spread nodes over
//! the machines of a multi-machine deployment. Runs in `O(n^2 k)`: only
//! suitable for small networks.

use log::info;
use std::collections::BTreeSet;

use crate::error::GeneratorError;
use crate::network::types::PlasmaNetwork;
use crate::utils::naming::idx_to_alphabetical;

/// Split the nodes of `network` into `k` buckets.
///
/// At every step the unassigned node and bucket with the fewest channels
/// between them are paired; ties go to the smaller bucket, then the lower
/// bucket index, then the lower node id. Every node ends up in exactly one
/// bucket.
pub fn approx_max_cut(network: &PlasmaNetwork, k: usize) -> Result<Vec<BTreeSet<usize>>, GeneratorError> {
    if k == 0 {
        return Err(GeneratorError::InvalidPartitionCount(k));
    }
    let n = network.node_count();
    let mut neighbours: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for edge in &network.edges {
        if edge.from != edge.to {
            neighbours[edge.from].insert(edge.to);
            neighbours[edge.to].insert(edge.from);
        }
    }

    // links[node][bucket]: neighbours of node already in bucket
    let mut links = vec![vec![0usize; k]; n];
    let mut buckets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); k];
    let mut unassigned: BTreeSet<usize> = (0..n).collect();

    while !unassigned.is_empty() {
        let mut best: Option<((usize, usize, usize), usize)> = None;
        for &node in &unassigned {
            for (bucket, members) in buckets.iter().enumerate() {
                let score = (links[node][bucket], members.len(), bucket);
                if best.map_or(true, |(best_score, _)| score < best_score) {
                    best = Some((score, node));
                }
            }
        }
        let Some(((_, _, bucket), node)) = best else {
            break;
        };
        unassigned.remove(&node);
        buckets[bucket].insert(node);
        for &other in &neighbours[node] {
            links[other][bucket] += 1;
        }
    }
    Ok(buckets)
}

/// Label every node with the alphabetical name of its bucket (`A`, `B`, ...).
pub fn assign_deploy_buckets(network: &mut PlasmaNetwork, k: usize) -> Result<(), GeneratorError> {
    let buckets = approx_max_cut(network, k)?;
    for (idx, bucket) in buckets.iter().enumerate() {
        let name = idx_to_alphabetical(idx);
        for &node in bucket {
            network.nodes[node].deploy_to = Some(name.clone());
        }
    }
    info!(
        "Partitioned {} nodes into {} deployment buckets: {:?}",
        network.node_count(),
        k,
        buckets.iter().map(BTreeSet::len).collect::<Vec<_>>()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{NodeType, SubnetworkKind};
    use crate::network::types::{Edge, Node};

    fn ring(n: usize) -> PlasmaNetwork {
        let nodes = (0..n)
            .map(|id| Node {
                id,
                label: format!("IntermediaryIT{}", id + 1),
                node_type: NodeType::Intermediary,
                country: "IT".to_string(),
                intermediary: None,
                color: "red".to_string(),
                show_label: true,
                weight: 1.0,
                pre_channel_balance: None,
                deploy_to: None,
            })
            .collect();
        let edges = (0..n)
            .flat_map(|u| {
                let edge = Edge::new(format!("l2.l2.{}", u), u, (u + 1) % n, SubnetworkKind::IntermediaryIntermediary);
                let back = edge.reversed();
                [edge, back]
            })
            .collect();
        PlasmaNetwork { nodes, edges }
    }

    #[test]
    fn test_every_node_in_exactly_one_bucket() {
        let network = ring(10);
        let buckets = approx_max_cut(&network, 3).unwrap();
        assert_eq!(buckets.len(), 3);
        let mut all: Vec<usize> = buckets.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        let sizes: Vec<usize> = buckets.iter().map(BTreeSet::len).collect();
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
    }

    #[test]
    fn test_more_buckets_than_nodes() {
        let buckets = approx_max_cut(&ring(2), 4).unwrap();
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets.iter().filter(|b| b.is_empty()).count(), 2);
    }

    #[test]
    fn test_zero_buckets_is_rejected() {
        assert_eq!(
            approx_max_cut(&ring(3), 0).unwrap_err(),
            GeneratorError::InvalidPartitionCount(0)
        );
    }

    #[test]
    fn test_deploy_labels() {
        let mut network = ring(6);
        assign_deploy_buckets(&mut network, 2).unwrap();
        assert!(network.nodes.iter().all(|n| matches!(n.deploy_to.as_deref(), Some("A") | Some("B"))));
    }
}
