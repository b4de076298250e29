//! Proportional allocation of node counts across nations.
//!
//! Every allocation in this module conserves its total exactly: nations are
//! visited from the largest to the smallest relative size, each one but the
//! last receives its rounded share, and the last one absorbs whatever is left
//! so that rounding errors never leak into the total.

use log::debug;
use std::collections::BTreeMap;

use crate::error::GeneratorError;
use crate::nation::spec::{NationSpec, NationSpecs};
use crate::utils::validation::validate_intermediary_count;

/// Node counts indexed by nation name
pub type NationCounts = BTreeMap<String, usize>;

/// Nations sorted by descending `(relative_size, name)`.
///
/// The name only breaks exact ties, which keeps the order deterministic.
pub fn allocation_order(specs: &NationSpecs) -> Vec<&NationSpec> {
    let mut ordered: Vec<&NationSpec> = specs.iter().collect();
    ordered.sort_by(|a, b| {
        b.relative_size()
            .total_cmp(&a.relative_size())
            .then_with(|| b.name().cmp(a.name()))
    });
    ordered
}

/// Split `total` across nations proportionally to their relative sizes.
///
/// The returned counts are non-negative and sum exactly to `total`.
///
/// # Examples
/// ```
/// use plasmagen::nation::{allocate, NationSpec, NationSpecs};
///
/// let specs = NationSpecs::from_specs(vec![
///     NationSpec::new("IT", 0.6).unwrap(),
///     NationSpec::new("FR", 0.4).unwrap(),
/// ]).unwrap();
/// let counts = allocate(100, &specs);
/// assert_eq!(counts["IT"], 60);
/// assert_eq!(counts["FR"], 40);
/// ```
pub fn allocate(total: usize, specs: &NationSpecs) -> NationCounts {
    let ordered = allocation_order(specs);
    let mut counts = NationCounts::new();
    let mut assigned = 0usize;

    if let Some((last, rest)) = ordered.split_last() {
        for spec in rest {
            let share = (spec.relative_size() * total as f64).round_ties_even();
            let count = if share > 0.0 { share as usize } else { 0 };
            counts.insert(spec.name().to_string(), count);
            assigned += count;
        }
        counts.insert(last.name().to_string(), total.saturating_sub(assigned));
    }

    // The remainder is floored at zero, so rounding up on the larger
    // nations may push the sum past the total; pull back from the smallest.
    let mut excess = counts.values().sum::<usize>().saturating_sub(total);
    for spec in ordered.iter().rev() {
        if excess == 0 {
            break;
        }
        if let Some(count) = counts.get_mut(spec.name()) {
            let taken = excess.min(*count);
            *count -= taken;
            excess -= taken;
        }
    }

    debug!("Allocated {} across {} nations: {:?}", total, counts.len(), counts);
    counts
}

/// Allocate intermediaries, guaranteeing at least one per nation.
///
/// One intermediary is reserved for each nation and the rest are split
/// proportionally.
pub fn allocate_intermediaries(
    total: usize,
    specs: &NationSpecs,
) -> Result<NationCounts, GeneratorError> {
    validate_intermediary_count(total, specs.nb_nations())?;

    let base: NationCounts = specs.nations().into_iter().map(|n| (n, 1)).collect();
    let remaining = allocate(total - base.len(), specs);

    assert!(
        base.keys().eq(remaining.keys()),
        "partial intermediary allocations cover different nations"
    );
    Ok(base
        .into_iter()
        .map(|(nation, one)| {
            let extra = remaining[&nation];
            (nation, one + extra)
        })
        .collect())
}

/// Per-nation merchant counts for each merchant tier
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantCounts {
    pub small: NationCounts,
    pub medium: NationCounts,
    pub large: NationCounts,
}

impl MerchantCounts {
    /// Total merchants of every tier across all nations
    pub fn total(&self) -> usize {
        [&self.small, &self.medium, &self.large]
            .iter()
            .flat_map(|tier| tier.values())
            .sum()
    }
}

/// Merchant tier totals `(small, medium, large)` for `total` merchants.
///
/// Medium and large tiers are rounded shares of the total; small merchants
/// take whatever is left, floored at zero.
pub fn merchant_tier_totals(total: usize, p_medium: f64, p_large: f64) -> (usize, usize, usize) {
    let medium = (total as f64 * p_medium).round_ties_even().max(0.0) as usize;
    let large = (total as f64 * p_large).round_ties_even().max(0.0) as usize;
    let small = total.saturating_sub(medium + large);
    (small, medium, large)
}

/// Allocate merchants of every tier across nations.
pub fn allocate_merchants(
    total: usize,
    p_medium: f64,
    p_large: f64,
    specs: &NationSpecs,
) -> MerchantCounts {
    let (small, medium, large) = merchant_tier_totals(total, p_medium, p_large);
    MerchantCounts {
        small: allocate(small, specs),
        medium: allocate(medium, specs),
        large: allocate(large, specs),
    }
}

/// Central banks per nation: one each, or none when a single shared central
/// bank serves every nation.
pub fn central_bank_counts(specs: &NationSpecs, unique_cb: bool) -> NationCounts {
    specs
        .nations()
        .into_iter()
        .map(|n| (n, if unique_cb { 0 } else { 1 }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(pairs: &[(&str, f64)]) -> NationSpecs {
        NationSpecs::from_specs(
            pairs
                .iter()
                .map(|(n, s)| NationSpec::new(*n, *s).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_two_nations_exact() {
        let counts = allocate(100, &specs(&[("IT", 0.6), ("FR", 0.4)]));
        assert_eq!(counts["IT"], 60);
        assert_eq!(counts["FR"], 40);
    }

    #[test]
    fn test_three_nations_conserve_total() {
        let s = specs(&[("IT", 0.34), ("FR", 0.33), ("DE", 0.33)]);
        let order: Vec<&str> = allocation_order(&s).iter().map(|n| n.name()).collect();
        assert_eq!(order, vec!["IT", "FR", "DE"]);

        let counts = allocate(10, &s);
        assert_eq!(counts.values().sum::<usize>(), 10);
        assert_eq!(counts["IT"], 3);
        assert_eq!(counts["FR"], 3);
        assert_eq!(counts["DE"], 4);
    }

    #[test]
    fn test_allocation_sums_for_many_totals() {
        let euro = NationSpecs::eurosystem();
        for total in [0usize, 1, 2, 7, 19, 20, 21, 99, 1000, 123_457] {
            let counts = allocate(total, &euro);
            assert_eq!(counts.len(), 20);
            assert_eq!(counts.values().sum::<usize>(), total, "total {}", total);
        }
    }

    #[test]
    fn test_zero_total() {
        let counts = allocate(0, &specs(&[("IT", 0.5), ("FR", 0.5)]));
        assert!(counts.values().all(|c| *c == 0));
    }

    #[test]
    fn test_intermediaries_at_least_one_per_nation() {
        let euro = NationSpecs::eurosystem();
        let counts = allocate_intermediaries(25, &euro).unwrap();
        assert_eq!(counts.values().sum::<usize>(), 25);
        assert!(counts.values().all(|c| *c >= 1));

        assert_eq!(
            allocate_intermediaries(19, &euro),
            Err(GeneratorError::TooFewIntermediaries { intermediaries: 19, nations: 20 })
        );
    }

    #[test]
    fn test_merchant_tiers() {
        assert_eq!(merchant_tier_totals(10_000, 0.3, 0.3), (4_000, 3_000, 3_000));
        assert_eq!(merchant_tier_totals(5, 0.3, 0.3), (1, 2, 2));
        // medium and large round up past the total: small is floored at zero
        assert_eq!(merchant_tier_totals(3, 0.5, 0.5), (0, 2, 2));

        let s = specs(&[("IT", 0.6), ("FR", 0.4)]);
        let merchants = allocate_merchants(1_000, 0.3, 0.2, &s);
        assert_eq!(merchants.total(), 1_000);
        assert_eq!(merchants.medium.values().sum::<usize>(), 300);
        assert_eq!(merchants.large.values().sum::<usize>(), 200);
        assert_eq!(merchants.small["IT"], 300);
    }

    #[test]
    fn test_central_banks() {
        let s = specs(&[("IT", 0.6), ("FR", 0.4)]);
        assert_eq!(central_bank_counts(&s, false).values().sum::<usize>(), 2);
        assert_eq!(central_bank_counts(&s, true).values().sum::<usize>(), 0);
    }
}
