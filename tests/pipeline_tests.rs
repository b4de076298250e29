//! End-to-end tests of the generation pipeline.

use std::collections::{BTreeMap, HashSet};

use plasmagen::config::{Config, NationsConfig, NetworkSize, SizeSpec};
use plasmagen::error::GeneratorError;
use plasmagen::export::{write_scaled_networks, ExportFormat};
use plasmagen::model::{payment_subnetwork_models, NodeType, SubnetworkKind};
use plasmagen::nation::allocate;
use plasmagen::network::{generate_plasma_network, postprocess, scale_to_fractions, PlasmaNetwork};
use plasmagen::utils::Amount;

fn small_config() -> Config {
    Config {
        seed: 1234,
        nations: NationsConfig::Specs(vec!["IT:0.5".into(), "FR:0.3".into(), "DE:0.2".into()]),
        size: SizeSpec::from_counts(3, 12, 600, 60),
        capacity_fractions: vec![0.0, 0.25, 0.5, 1.0],
        ..Config::default()
    }
}

fn generate(config: &Config) -> (PlasmaNetwork, NetworkSize) {
    config.validate().unwrap();
    let specs = config.nation_specs().unwrap();
    let size = config.network_size(specs.nb_nations()).unwrap();
    let counts = size.layer_counts(&specs, config.unique_cb).unwrap();
    let mut catalog = payment_subnetwork_models(&counts, &config.model, &config.overrides, config.unique_cb).unwrap();
    if let Some(kind) = config.subnetwork_kind_filter().unwrap() {
        catalog.retain_kind(kind);
    }
    let (mut network, _) = generate_plasma_network(&catalog, config.seed, &specs, config.unique_cb).unwrap();
    postprocess(&mut network, config.deploy_partitions).unwrap();
    (network, size)
}

fn assert_channels_conserved(network: &PlasmaNetwork) {
    for (channel_id, edges) in network.channels() {
        assert_eq!(edges.len(), 2, "channel {} should have two directions", channel_id);
        let (a, b) = (edges[0], edges[1]);
        assert_eq!((a.from, a.to), (b.to, b.from));
        assert_eq!(a.capacity, b.capacity);
        assert_eq!(a.balance + b.balance, a.capacity, "channel {}", channel_id);
    }
}

#[test]
fn test_generation_is_deterministic() {
    let config = small_config();
    let (first, _) = generate(&config);
    let (second, _) = generate(&config);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let other = Config { seed: 4321, ..small_config() };
    let (third, _) = generate(&other);
    assert_ne!(first.edges, third.edges);
}

#[test]
fn test_node_counts_follow_allocation() {
    let config = small_config();
    let specs = config.nation_specs().unwrap();
    let (network, size) = generate(&config);
    let by_type = network.count_by_type();
    assert_eq!(by_type[&NodeType::CentralBank], 3);
    assert_eq!(by_type[&NodeType::Intermediary], 12);
    assert_eq!(by_type[&NodeType::RetailBanked], 600);
    let merchants: usize = [NodeType::MerchantSmall, NodeType::MerchantMedium, NodeType::MerchantLarge]
        .iter()
        .map(|t| by_type.get(t).copied().unwrap_or(0))
        .sum();
    assert_eq!(merchants, size.merchants);

    let mut retail_by_country: BTreeMap<String, usize> = BTreeMap::new();
    for node in network.nodes.iter().filter(|n| n.node_type == NodeType::RetailBanked) {
        *retail_by_country.entry(node.country.clone()).or_default() += 1;
    }
    assert_eq!(retail_by_country, allocate(600, &specs));
    assert_eq!(retail_by_country["IT"], 300);
}

#[test]
fn test_labels_are_unique_and_ids_dense() {
    let (network, _) = generate(&small_config());
    let labels: HashSet<&str> = network.nodes.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels.len(), network.node_count());
    for (idx, node) in network.nodes.iter().enumerate() {
        assert_eq!(node.id, idx);
    }
    for edge in &network.edges {
        assert!(edge.from < network.node_count());
        assert!(edge.to < network.node_count());
    }
}

#[test]
fn test_every_channel_conserves_balance() {
    let (network, _) = generate(&small_config());
    assert!(network.edge_count() > 0);
    assert_channels_conserved(&network);

    for edge in &network.edges {
        let from = network.nodes[edge.from].node_type;
        let to = network.nodes[edge.to].node_type;
        if from == NodeType::Intermediary && to == NodeType::RetailBanked {
            assert_eq!(edge.balance, edge.capacity * 9 / 10);
        }
    }
}

#[test]
fn test_users_point_to_their_intermediary() {
    let (network, _) = generate(&small_config());
    for node in &network.nodes {
        if node.node_type.has_intermediary_slot() {
            let intermediary = node.intermediary.expect("user without intermediary");
            let parent = &network.nodes[intermediary];
            assert_eq!(parent.node_type, NodeType::Intermediary);
            assert_eq!(parent.country, node.country);
        } else {
            assert_eq!(node.intermediary, None);
        }
    }
}

#[test]
fn test_pre_channel_balances() {
    let (network, _) = generate(&small_config());
    for node in &network.nodes {
        let outgoing: Vec<_> = network.edges.iter().filter(|e| e.from == node.id).collect();
        if outgoing.is_empty() {
            assert_eq!(node.pre_channel_balance, None);
        } else {
            let expected: f64 = outgoing.iter().map(|e| e.balance as f64 + 3.0).sum();
            let actual = node.pre_channel_balance.unwrap();
            assert!(actual >= expected && actual - expected < 0.01 + 1e-9);
        }
    }
}

#[test]
fn test_scaling_keeps_invariants() {
    let config = small_config();
    let (network, _) = generate(&config);
    let copies = scale_to_fractions(&network, &config.capacity_fractions).unwrap();
    assert_eq!(copies.len(), 4);
    for (fraction, scaled) in &copies {
        assert_channels_conserved(scaled);
        assert_eq!(scaled.nodes, network.nodes);
        for (before, after) in network.edges.iter().zip(&scaled.edges) {
            let kind = before.kind().unwrap();
            if kind.is_capacity_exempt() {
                assert_eq!(after.capacity, before.capacity);
            } else {
                assert_eq!(after.capacity, (before.capacity as f64 * fraction).round_ties_even() as u64);
            }
        }
    }
    let (_, full) = &copies[3];
    assert_eq!(full, &network);
}

#[test]
fn test_peer_layer_with_unbanked_users() {
    let mut config = small_config();
    config.size.unbanked_fraction = Some(0.2);
    config.model.subnetworks.citizen_citizen.enabled = true;
    let (network, size) = generate(&config);
    assert_eq!(size.retail_unbanked, 120);
    assert_eq!(size.retail_banked, 480);
    assert_eq!(network.count_by_type()[&NodeType::RetailUnbanked], 120);
    assert_channels_conserved(&network);

    let peer_edges: Vec<_> = network
        .edges
        .iter()
        .filter(|e| e.kind() == Some(SubnetworkKind::CitizenCitizen))
        .collect();
    assert!(!peer_edges.is_empty());
    for edge in &peer_edges {
        assert!(network.nodes[edge.from].node_type.is_retail());
        assert!(network.nodes[edge.to].node_type.is_retail());
        assert_eq!(network.nodes[edge.from].country, network.nodes[edge.to].country);
        assert!(edge.balance == edge.capacity || edge.balance == 0);
        assert!(edge.is_private);
    }
}

#[test]
fn test_unique_central_bank() {
    let mut config = small_config();
    config.unique_cb = true;
    config.size = SizeSpec::from_counts(1, 12, 600, 60);
    let (network, _) = generate(&config);
    let cbs: Vec<_> = network
        .nodes
        .iter()
        .filter(|n| n.node_type == NodeType::CentralBank)
        .collect();
    assert_eq!(cbs.len(), 1);
    assert_eq!(cbs[0].country, "EU");
    assert!(network.edges.iter().all(|e| e.kind() != Some(SubnetworkKind::CbCb)));
    let cb_links = network
        .edges
        .iter()
        .filter(|e| e.kind() == Some(SubnetworkKind::CbIntermediary) && e.from == cbs[0].id)
        .count();
    assert_eq!(cb_links, 12);
}

#[test]
fn test_subnetwork_filter() {
    let mut config = small_config();
    config.subnetwork_filter = Some("2<>2".to_string());
    let (network, _) = generate(&config);
    assert!(network.edge_count() > 0);
    assert!(network.edges.iter().all(|e| e.edge_type == "2<>2"));
    assert!(network.nodes.iter().all(|n| n.node_type == NodeType::Intermediary));

    config.subnetwork_filter = Some("9<>9".to_string());
    assert_eq!(
        config.validate().unwrap_err(),
        GeneratorError::UnknownSubnetwork { label: "9<>9".to_string() }
    );
}

#[test]
fn test_deployment_partitioning() {
    let mut config = small_config();
    config.size = SizeSpec::from_counts(3, 6, 60, 9);
    config.deploy_partitions = Some(3);
    let (network, _) = generate(&config);
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for node in &network.nodes {
        *buckets.entry(node.deploy_to.clone().unwrap()).or_default() += 1;
    }
    assert_eq!(buckets.keys().cloned().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    assert_eq!(buckets.values().sum::<usize>(), network.node_count());
}

#[test]
fn test_export_every_fraction() {
    let config = small_config();
    let (network, _) = generate(&config);
    let copies = scale_to_fractions(&network, &[0.5, 1.0]).unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let paths = write_scaled_networks(&copies, ExportFormat::Json, dir.path()).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(dir.path().join("capacity-0.5").join("network.json").is_file());
    let content = std::fs::read_to_string(&paths[1]).unwrap();
    let parsed: PlasmaNetwork = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.edge_count(), network.edge_count());

    let gml = write_scaled_networks(&copies, ExportFormat::Gml, dir.path()).unwrap();
    assert!(std::fs::read_to_string(&gml[0]).unwrap().starts_with("graph ["));
}

#[test]
fn test_configuration_errors() {
    let mut config = small_config();
    config.nations = NationsConfig::List(vec!["IT".into(), "EU".into()]);
    assert!(matches!(config.validate(), Err(GeneratorError::ReservedNationCode { .. })));

    let mut config = small_config();
    config.size.intermediaries = Some(Amount(2.0));
    assert_eq!(
        config.validate().unwrap_err(),
        GeneratorError::TooFewIntermediaries { intermediaries: 2, nations: 3 }
    );

    let mut config = small_config();
    config.size.p_small_merchants = Some(0.5);
    config.size.p_medium_merchants = Some(0.3);
    config.size.p_large_merchants = Some(0.3);
    assert!(matches!(config.validate(), Err(GeneratorError::MerchantProbabilities { .. })));

    let mut config = small_config();
    config.capacity_fractions = vec![1.2];
    assert_eq!(config.validate().unwrap_err(), GeneratorError::InvalidCapacityFraction(1.2));

    let mut config = small_config();
    config.deploy_partitions = Some(0);
    assert_eq!(config.validate().unwrap_err(), GeneratorError::InvalidPartitionCount(0));
}
