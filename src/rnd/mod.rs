//! Random generators for subnetwork topologies and edge attributes.

pub mod attributes;
pub mod distributions;
pub mod topology;

pub use attributes::{apply_attribute_rules, Direction};
pub use distributions::{derive_seed, lognormal_set_partition, seeded_rng, GeneratorRng};
pub use topology::generate_topology;
