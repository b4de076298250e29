//! Attribute generators.
//!
//! [`apply_attribute_rules`] is the single interpreter for
//! [`AttributeModel`]: each rule is sampled for every edge in order and the
//! resulting values are written onto the edges.

use rand::distributions::Distribution;
use rand::Rng;

use crate::error::GeneratorError;
use crate::model::types::{AttributeModel, AttributeRule, AttributeValue, EdgeAttribute};
use crate::network::types::{Edge, SubnetworkNode};
use crate::rnd::distributions::{capped_exponential, cent_rounded_uniform, discrete_distribution, ScaledBeta};
use crate::utils::amount::float_round;

/// Which attributes to write when applying rules to a set of edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward edges: every rule applies
    Forward,
    /// Reverse edges: capacity is mirrored from the forward edge, not drawn
    Reverse,
}

/// Draw one value tuple per edge for `rule`.
pub fn sample_rule<R: Rng + ?Sized>(
    rule: &AttributeRule,
    edges: &[Edge],
    nodes: &[SubnetworkNode],
    rng: &mut R,
) -> Result<Vec<Vec<AttributeValue>>, GeneratorError> {
    rule.validate()?;
    let n = edges.len();
    let values = match &rule.model {
        AttributeModel::Fixed { values } => vec![values.clone(); n],
        AttributeModel::Varying { national, international } => edges
            .iter()
            .map(|edge| {
                let same_country = nodes[edge.from].country == nodes[edge.to].country;
                vec![if same_country { national.clone() } else { international.clone() }]
            })
            .collect(),
        AttributeModel::Uniform { min, max } => (0..n)
            .map(|_| vec![AttributeValue::Number(cent_rounded_uniform(rng, *min, *max))])
            .collect(),
        AttributeModel::Exponential { means, digits, low_cap } => {
            // one column of samples per label
            let columns: Vec<Vec<f64>> = means
                .iter()
                .zip(digits)
                .map(|(mean, digits)| (0..n).map(|_| capped_exponential(rng, *mean, *digits, *low_cap)).collect())
                .collect();
            (0..n)
                .map(|i| columns.iter().map(|col| AttributeValue::Number(col[i])).collect())
                .collect()
        }
        AttributeModel::Beta { min, max, mean, dev } => {
            let beta = ScaledBeta::new(*min, *max, *mean, *dev)?;
            (0..n)
                .map(|_| vec![AttributeValue::Number(float_round(beta.sample(rng), 2))])
                .collect()
        }
        AttributeModel::CustomDiscrete { outcomes } => {
            let probabilities: Vec<f64> = outcomes.iter().map(|(p, _)| *p).collect();
            let dist = discrete_distribution(&probabilities)?;
            (0..n).map(|_| outcomes[dist.sample(rng)].1.clone()).collect()
        }
    };
    Ok(values)
}

/// Write a single attribute value onto an edge
pub fn set_attribute(edge: &mut Edge, label: EdgeAttribute, value: &AttributeValue) -> Result<(), GeneratorError> {
    let mismatch = || GeneratorError::AttributeTypeMismatch {
        label: label.name().to_string(),
        value: value.to_string(),
    };
    match (label, value) {
        (EdgeAttribute::Type, AttributeValue::Text(text)) => edge.edge_type = text.clone(),
        (EdgeAttribute::Capacity, AttributeValue::Number(x)) => {
            if !x.is_finite() || *x < 0.0 {
                return Err(mismatch());
            }
            edge.capacity = *x as u64;
        }
        (EdgeAttribute::SourceFeeBase, AttributeValue::Number(x)) => edge.source_fee.base = *x,
        (EdgeAttribute::SourceFeeRate, AttributeValue::Number(x)) => edge.source_fee.rate = *x,
        (EdgeAttribute::TargetFeeBase, AttributeValue::Number(x)) => edge.target_fee.base = *x,
        (EdgeAttribute::TargetFeeRate, AttributeValue::Number(x)) => edge.target_fee.rate = *x,
        (EdgeAttribute::IsPrivate, AttributeValue::Flag(flag)) => edge.is_private = *flag,
        (EdgeAttribute::Weight, AttributeValue::Number(x)) => edge.weight = *x,
        _ => return Err(mismatch()),
    }
    Ok(())
}

/// Apply every rule to `edges`, in rule order.
///
/// For [`Direction::Reverse`] capacity rules are skipped; the caller copies
/// capacities from the forward edges.
pub fn apply_attribute_rules<R: Rng + ?Sized>(
    edges: &mut [Edge],
    nodes: &[SubnetworkNode],
    rules: &[AttributeRule],
    direction: Direction,
    rng: &mut R,
) -> Result<(), GeneratorError> {
    for rule in rules {
        if direction == Direction::Reverse && rule.sets_capacity() {
            continue;
        }
        let values = sample_rule(rule, edges, nodes, rng)?;
        for (edge, tuple) in edges.iter_mut().zip(&values) {
            for (label, value) in rule.labels.iter().zip(tuple) {
                set_attribute(edge, *label, value)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{NodeType, SubnetworkKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn node(label: &str, country: &str) -> SubnetworkNode {
        SubnetworkNode {
            label: label.to_string(),
            node_type: NodeType::Intermediary,
            country: country.to_string(),
            color: "red".to_string(),
            show_label: true,
            weight: 1.0,
        }
    }

    fn sample_edges() -> (Vec<Edge>, Vec<SubnetworkNode>) {
        let nodes = vec![node("IntermediaryIT1", "IT"), node("IntermediaryIT2", "IT"), node("IntermediaryFR1", "FR")];
        let edges = vec![
            Edge::new("l2.l2.0", 0, 1, SubnetworkKind::IntermediaryIntermediary),
            Edge::new("l2.l2.1", 1, 2, SubnetworkKind::IntermediaryIntermediary),
        ];
        (edges, nodes)
    }

    #[test]
    fn test_fixed_and_varying() {
        let (mut edges, nodes) = sample_edges();
        let rules = vec![
            AttributeRule::single(EdgeAttribute::Capacity, AttributeModel::Fixed { values: vec![AttributeValue::Number(1_000_000.0)] }),
            AttributeRule::single(EdgeAttribute::IsPrivate, AttributeModel::Fixed { values: vec![AttributeValue::Flag(true)] }),
            AttributeRule::single(
                EdgeAttribute::Weight,
                AttributeModel::Varying {
                    national: AttributeValue::Number(2.0),
                    international: AttributeValue::Number(5.0),
                },
            ),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        apply_attribute_rules(&mut edges, &nodes, &rules, Direction::Forward, &mut rng).unwrap();
        assert!(edges.iter().all(|e| e.capacity == 1_000_000 && e.is_private));
        assert_eq!(edges[0].weight, 2.0);
        assert_eq!(edges[1].weight, 5.0);
    }

    #[test]
    fn test_reverse_direction_skips_capacity() {
        let (mut edges, nodes) = sample_edges();
        let rules = vec![AttributeRule::single(
            EdgeAttribute::Capacity,
            AttributeModel::Fixed { values: vec![AttributeValue::Number(10.0)] },
        )];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        apply_attribute_rules(&mut edges, &nodes, &rules, Direction::Reverse, &mut rng).unwrap();
        assert!(edges.iter().all(|e| e.capacity == 0));
    }

    #[test]
    fn test_custom_discrete_draws_whole_tuples() {
        let (mut edges, nodes) = sample_edges();
        let rules = vec![AttributeRule::new(
            vec![EdgeAttribute::SourceFeeBase, EdgeAttribute::SourceFeeRate],
            AttributeModel::CustomDiscrete {
                outcomes: vec![
                    (0.5, vec![AttributeValue::Number(0.002), AttributeValue::Number(0.00015)]),
                    (0.5, vec![AttributeValue::Number(0.0025), AttributeValue::Number(0.0001)]),
                ],
            },
        )];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        apply_attribute_rules(&mut edges, &nodes, &rules, Direction::Forward, &mut rng).unwrap();
        for edge in &edges {
            let pair = (edge.source_fee.base, edge.source_fee.rate);
            assert!(pair == (0.002, 0.00015) || pair == (0.0025, 0.0001));
        }
    }

    #[test]
    fn test_exponential_and_beta() {
        let (mut edges, nodes) = sample_edges();
        let rules = vec![
            AttributeRule::new(
                vec![EdgeAttribute::TargetFeeBase, EdgeAttribute::TargetFeeRate],
                AttributeModel::Exponential { means: vec![0.002, 0.005], digits: vec![4, 8], low_cap: 0.0 },
            ),
            AttributeRule::single(
                EdgeAttribute::Capacity,
                AttributeModel::Beta { min: 1000.0, max: 500_000.0, mean: 50_000.0, dev: 30_000.0 },
            ),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        apply_attribute_rules(&mut edges, &nodes, &rules, Direction::Forward, &mut rng).unwrap();
        for edge in &edges {
            assert!(edge.target_fee.base >= 0.0 && edge.target_fee.rate >= 0.0);
            assert!((1000..=500_000).contains(&edge.capacity));
        }
    }

    #[test]
    fn test_type_mismatch() {
        let (mut edges, nodes) = sample_edges();
        let rules = vec![AttributeRule::single(
            EdgeAttribute::IsPrivate,
            AttributeModel::Fixed { values: vec![AttributeValue::Number(1.0)] },
        )];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = apply_attribute_rules(&mut edges, &nodes, &rules, Direction::Forward, &mut rng).unwrap_err();
        assert!(matches!(err, GeneratorError::AttributeTypeMismatch { .. }));
    }
}
