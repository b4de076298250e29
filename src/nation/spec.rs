//! Nation specifications.
//!
//! A nation is an uppercase code with a relative size (its share of the
//! simulated population). A [`NationSpecs`] collection always sums to 1.0.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::GeneratorError;
use crate::utils::validation::sums_to_unity;

/// Country code used for nodes and subnetworks spanning all nations
pub const EU_COUNTRY_CODE: &str = "EU";

fn nation_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]+$").expect("static regex is valid"))
}

/// A single nation and its relative size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationSpec {
    name: String,
    relative_size: f64,
}

impl NationSpec {
    /// Create a nation spec, checking the name and the relative size.
    pub fn new(name: impl Into<String>, relative_size: f64) -> Result<Self, GeneratorError> {
        let name = name.into();
        if !nation_name_regex().is_match(&name) {
            return Err(GeneratorError::InvalidNationName { name });
        }
        if name == EU_COUNTRY_CODE {
            return Err(GeneratorError::ReservedNationCode { name });
        }
        if !(0.0..=1.0).contains(&relative_size) {
            return Err(GeneratorError::RelativeSizeOutOfRange {
                name,
                value: relative_size,
            });
        }
        Ok(Self { name, relative_size })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative_size(&self) -> f64 {
        self.relative_size
    }
}

impl FromStr for NationSpec {
    type Err = GeneratorError;

    /// Parse a `NAME:relative_size` string such as `IT:0.5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| GeneratorError::InvalidNationSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };
        let tokens: Vec<&str> = s.split(':').collect();
        if tokens.len() != 2 {
            return Err(invalid("the nation specification string must be of 2 tokens"));
        }
        let relative_size = tokens[1]
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("the relative size is not a float"))?;
        NationSpec::new(tokens[0].trim(), relative_size)
            .map_err(|e| invalid(&e.to_string()))
    }
}

/// Nation specifications indexed by nation name.
///
/// Invariants: non-empty, unique names, relative sizes summing to 1.0
/// within 1e-9. Iteration is in name order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationSpecs {
    specs_by_name: BTreeMap<String, NationSpec>,
}

impl NationSpecs {
    /// Build a collection from a sequence of specs, rejecting duplicates.
    pub fn from_specs(specs: Vec<NationSpec>) -> Result<Self, GeneratorError> {
        let mut specs_by_name = BTreeMap::new();
        let mut duplicates = Vec::new();
        for spec in specs {
            let name = spec.name.clone();
            if specs_by_name.insert(name.clone(), spec).is_some() && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        if !duplicates.is_empty() {
            return Err(GeneratorError::DuplicateNations {
                names: duplicates.join(", "),
            });
        }
        Self::from_map(specs_by_name)
    }

    fn from_map(specs_by_name: BTreeMap<String, NationSpec>) -> Result<Self, GeneratorError> {
        if specs_by_name.is_empty() {
            return Err(GeneratorError::EmptyNations);
        }
        let sum: f64 = specs_by_name.values().map(|s| s.relative_size).sum();
        if !sums_to_unity(sum) {
            return Err(GeneratorError::RelativeSizesNotNormalized { sum });
        }
        Ok(Self { specs_by_name })
    }

    /// Give every nation in the list the same relative size.
    pub fn from_nation_list<S: AsRef<str>>(nations: &[S]) -> Result<Self, GeneratorError> {
        if nations.is_empty() {
            return Err(GeneratorError::EmptyNations);
        }
        let share = 1.0 / nations.len() as f64;
        let specs = nations
            .iter()
            .map(|name| NationSpec::new(name.as_ref(), share))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_specs(specs)
    }

    /// Population-weighted specs for the 20 Eurosystem countries.
    pub fn eurosystem() -> Self {
        let population = eurosystem_population_by_country();
        let total: u64 = population.iter().map(|(_, p)| p).sum();
        let specs_by_name = population
            .iter()
            .map(|(name, p)| {
                let spec = NationSpec {
                    name: name.to_string(),
                    relative_size: *p as f64 / total as f64,
                };
                (name.to_string(), spec)
            })
            .collect();
        Self { specs_by_name }
    }

    /// Select a subset of the Eurosystem nations, renormalizing their sizes.
    pub fn select_eurosystem_subset<S: AsRef<str>>(nations: &[S]) -> Result<Self, GeneratorError> {
        Self::eurosystem().select(nations)
    }

    /// Select a subset of these nations, renormalizing their sizes to sum to 1.
    pub fn select<S: AsRef<str>>(&self, nations: &[S]) -> Result<Self, GeneratorError> {
        if nations.is_empty() {
            return Err(GeneratorError::EmptyNations);
        }
        let mut selected = BTreeMap::new();
        for name in nations {
            let spec = self.get_spec(name.as_ref())?;
            selected.insert(spec.name.clone(), spec.clone());
        }
        let total: f64 = selected.values().map(|s: &NationSpec| s.relative_size).sum();
        if total <= 0.0 {
            return Err(GeneratorError::RelativeSizesNotNormalized { sum: total });
        }
        for spec in selected.values_mut() {
            spec.relative_size /= total;
        }
        Self::from_map(selected)
    }

    /// Replace the relative sizes of a subset of nations.
    ///
    /// The nations not overridden share the remaining weight in proportion to
    /// their previous sizes, so the total stays 1.0.
    pub fn with_overrides(&self, overrides: &[NationSpec]) -> Result<Self, GeneratorError> {
        let mut override_map = BTreeMap::new();
        for spec in overrides {
            if !self.specs_by_name.contains_key(&spec.name) {
                return Err(GeneratorError::UnknownNation {
                    name: spec.name.clone(),
                });
            }
            override_map.insert(spec.name.clone(), spec.clone());
        }

        let fixed: f64 = override_map.values().map(|s: &NationSpec| s.relative_size).sum();
        if fixed > 1.0 + crate::utils::validation::UNITY_TOLERANCE {
            return Err(GeneratorError::OverridesExceedUnity { sum: fixed });
        }
        let remaining = (1.0 - fixed).max(0.0);

        let others_total: f64 = self
            .specs_by_name
            .values()
            .filter(|s| !override_map.contains_key(&s.name))
            .map(|s| s.relative_size)
            .sum();
        let scaling = if others_total > 0.0 { remaining / others_total } else { 0.0 };
        debug!(
            "Overriding {} nations (fixed share {:.6}), rescaling the others by {:.6}",
            override_map.len(),
            fixed,
            scaling
        );

        let mut result = BTreeMap::new();
        for (name, spec) in &self.specs_by_name {
            let new_spec = match override_map.get(name) {
                Some(o) => o.clone(),
                None => NationSpec {
                    name: name.clone(),
                    relative_size: spec.relative_size * scaling,
                },
            };
            result.insert(name.clone(), new_spec);
        }
        Self::from_map(result)
    }

    /// Names of all nations, in sorted order
    pub fn nations(&self) -> Vec<String> {
        self.specs_by_name.keys().cloned().collect()
    }

    pub fn nb_nations(&self) -> usize {
        self.specs_by_name.len()
    }

    pub fn get_spec(&self, name: &str) -> Result<&NationSpec, GeneratorError> {
        self.specs_by_name
            .get(name)
            .ok_or_else(|| GeneratorError::UnknownNation {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &NationSpec> {
        self.specs_by_name.values()
    }

    /// Sum of all relative sizes (1.0 up to rounding)
    pub fn total_relative_size(&self) -> f64 {
        self.specs_by_name.values().map(|s| s.relative_size).sum()
    }
}

/// Eurosystem countries with their absolute population on 2023-01-01
/// (Eurostat).
pub fn eurosystem_population_by_country() -> &'static [(&'static str, u64)] {
    &[
        ("AT", 9_104_772),
        ("BE", 11_754_004),
        ("CY", 920_701),
        ("DE", 84_358_845),
        ("EE", 1_365_884),
        ("ES", 48_059_777),
        ("FI", 5_563_970),
        ("FR", 68_070_697),
        ("GR", 10_394_055),
        ("HR", 3_850_894),
        ("IE", 5_194_336),
        ("IT", 58_850_717),
        ("LT", 2_857_279),
        ("LU", 660_809),
        ("LV", 1_883_008),
        ("MT", 542_051),
        ("NL", 17_811_291),
        ("PT", 10_467_366),
        ("SI", 2_116_792),
        ("SK", 5_428_792),
    ]
}
