//! Subnetwork instantiation.

use log::debug;

use crate::error::GeneratorError;
use crate::model::types::{ChannelType, NodeType, SubnetworkModel};
use crate::nation::EU_COUNTRY_CODE;
use crate::network::balance::assign_balances;
use crate::network::types::{Edge, Subnetwork, SubnetworkNode};
use crate::rnd::attributes::{apply_attribute_rules, Direction};
use crate::rnd::distributions::seeded_rng;
use crate::rnd::topology::generate_topology;

/// Build one concrete subnetwork for `nations`.
///
/// National models are instantiated with a single nation, international ones
/// with every nation. With `unique_cb` the central bank layer is a single node
/// of the aggregate nation. The random stream depends only on the seed, the
/// subnetwork kind and the nations, so instances can be built in any order.
pub fn instantiate_subnetwork(
    model: &SubnetworkModel,
    seed: u64,
    nations: &[String],
    unique_cb: bool,
) -> Result<Subnetwork, GeneratorError> {
    let first_nation = nations.first().ok_or(GeneratorError::EmptyNationList)?;
    let international = model.channel_type == ChannelType::International;
    let nation_id = if international {
        if unique_cb {
            nations.join("-")
        } else {
            EU_COUNTRY_CODE.to_string()
        }
    } else {
        first_nation.clone()
    };

    let mut nodes = Vec::new();
    let mut group_sizes = Vec::with_capacity(model.node_groups.len());
    for group in &model.node_groups {
        let before = nodes.len();
        if group.node_type == NodeType::CentralBank && unique_cb {
            nodes.push(SubnetworkNode {
                label: group.label.render(EU_COUNTRY_CODE, 1),
                node_type: group.node_type,
                country: EU_COUNTRY_CODE.to_string(),
                color: group.color.clone(),
                show_label: group.show_label,
                weight: group.weight,
            });
        } else {
            for nation in nations {
                for i in 0..group.count_for(nation)? {
                    nodes.push(SubnetworkNode {
                        label: group.label.render(nation, i + 1),
                        node_type: group.node_type,
                        country: nation.clone(),
                        color: group.color.clone(),
                        show_label: group.show_label,
                        weight: group.weight,
                    });
                }
            }
        }
        group_sizes.push(nodes.len() - before);
    }

    let mut rng = seeded_rng(seed, &[model.kind.key(), &nation_id]);
    let pairs = generate_topology(&model.topology, &group_sizes, &mut rng)?;
    let key_nation = if nations.len() == 1 { Some(first_nation.as_str()) } else { None };
    let mut forward: Vec<Edge> = pairs
        .into_iter()
        .enumerate()
        .map(|(idx, (u, v))| Edge::new(model.edge_key.render(key_nation, idx), u, v, model.kind))
        .collect();
    apply_attribute_rules(&mut forward, &nodes, &model.attributes, Direction::Forward, &mut rng)?;

    let mut reverse: Vec<Edge> = forward.iter().map(Edge::reversed).collect();
    apply_attribute_rules(&mut reverse, &nodes, &model.attributes, Direction::Reverse, &mut rng)?;

    assign_balances(&mut forward, &mut reverse, &nodes, model.bidir);

    debug!(
        "Instantiated {} for {}: {} nodes, {} channels",
        model.id,
        nation_id,
        nodes.len(),
        forward.len()
    );

    let mut edges = forward;
    edges.extend(reverse);
    Ok(Subnetwork {
        kind: model.kind,
        id: model.id.clone(),
        nation: (!international).then(|| first_nation.clone()),
        nodes,
        edges,
    })
}
