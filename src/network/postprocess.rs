//! Post-processing of a composed network.

use log::{debug, info};

use crate::error::GeneratorError;
use crate::network::partition::assign_deploy_buckets;
use crate::network::types::PlasmaNetwork;
use crate::utils::amount::float_round_up;

/// Fee paid once for opening a channel.
pub const CHANNEL_OPENING_FEE: f64 = 3.0;

/// Set the funds every node needs before opening its channels: the sum of
/// its outgoing balances plus one opening fee per channel, rounded up to the
/// cent. Nodes without outgoing edges are left untouched.
pub fn compute_pre_channel_balances(network: &mut PlasmaNetwork) {
    let mut totals: Vec<Option<f64>> = vec![None; network.node_count()];
    for edge in &network.edges {
        let total = totals[edge.from].get_or_insert(0.0);
        *total += edge.balance as f64 + CHANNEL_OPENING_FEE;
    }
    for (node, total) in network.nodes.iter_mut().zip(totals) {
        if let Some(total) = total {
            node.pre_channel_balance = Some(float_round_up(total, 2));
        }
    }
}

/// Run the post-processing steps on a freshly composed network.
///
/// Deployment partitioning only runs when a partition count is given.
pub fn postprocess(network: &mut PlasmaNetwork, deploy_partitions: Option<usize>) -> Result<(), GeneratorError> {
    compute_pre_channel_balances(network);
    debug!("Computed pre-channel balances for {} nodes", network.node_count());
    match deploy_partitions {
        Some(k) => assign_deploy_buckets(network, k)?,
        None => info!("Deployment partitioning disabled"),
    }
    Ok(())
}
