//! Capacity scaling.
//!
//! A scaled copy of a network multiplies the capacity of every channel by a
//! fraction, except for channels of capacity-exempt subnetworks, and rebalances
//! so that both directions still add up to the scaled capacity.

use log::{debug, info};
use rayon::prelude::*;
use std::collections::HashMap;

use crate::error::GeneratorError;
use crate::network::types::PlasmaNetwork;
use crate::utils::validation::validate_capacity_fraction;

fn scaled(value: u64, fraction: f64) -> u64 {
    (value as f64 * fraction).round_ties_even() as u64
}

/// Return a copy of `network` with capacities scaled by `fraction`.
///
/// Edges are visited in `(from, to, channel_id)` order. The first direction
/// of each channel gets its balance scaled and rounded; the other direction
/// receives the rest of the scaled capacity. Node attributes, including the
/// pre-channel balance, are copied unchanged.
pub fn scale_capacities(network: &PlasmaNetwork, fraction: f64) -> Result<PlasmaNetwork, GeneratorError> {
    validate_capacity_fraction(fraction)?;
    let mut result = network.clone();

    let mut order: Vec<usize> = (0..result.edges.len()).collect();
    order.sort_by(|a, b| result.edges[*a].key().cmp(&result.edges[*b].key()));

    // scaled balance of the first direction seen, per channel
    let mut first_balances: HashMap<String, u64> = HashMap::new();
    let mut exempt = 0usize;
    for idx in order {
        let edge = &mut result.edges[idx];
        if edge.kind().is_some_and(|kind| kind.is_capacity_exempt()) {
            exempt += 1;
            continue;
        }
        let capacity = scaled(edge.capacity, fraction);
        edge.balance = match first_balances.get(&edge.channel_id) {
            Some(first) => {
                assert!(*first <= capacity, "scaled balance exceeds capacity in channel {}", edge.channel_id);
                capacity - first
            }
            None => {
                let balance = scaled(edge.balance, fraction);
                first_balances.insert(edge.channel_id.clone(), balance);
                balance
            }
        };
        edge.capacity = capacity;
    }
    debug!(
        "Scaled {} edges by {} ({} exempt edges kept)",
        result.edges.len() - exempt,
        fraction,
        exempt
    );
    result.assert_conservation();
    Ok(result)
}

/// Scale one network to every fraction, in parallel.
///
/// The copies are returned in the order of `fractions`.
pub fn scale_to_fractions(
    network: &PlasmaNetwork,
    fractions: &[f64],
) -> Result<Vec<(f64, PlasmaNetwork)>, GeneratorError> {
    info!("Scaling capacities for {} fractions in parallel...", fractions.len());
    fractions
        .par_iter()
        .map(|fraction| scale_capacities(network, *fraction).map(|scaled| (*fraction, scaled)))
        .collect()
}
