//! # Plasmagen - Topology generator for payment-channel network simulations
//!
//! This library generates synthetic multi-layer payment-channel networks
//! (central banks, intermediaries, retail users and merchants spread over a
//! set of nations) for use as simulator input.
//!
//! ## Overview
//!
//! A run turns a configuration into one network and a family of scaled copies
//! of it:
//!
//! 1. node counts are resolved from counts or ratios and split across nations
//!    in proportion to their relative size;
//! 2. the subnetwork catalog describes each layer of channels (which node
//!    groups take part, the random graph linking them, the random attributes
//!    of every edge);
//! 3. every subnetwork is instantiated with its own seeded random stream and
//!    the instances are merged on their node labels;
//! 4. balances are split between the two directions of every channel so that
//!    they always add up to its capacity;
//! 5. the network is scaled to each requested capacity fraction, keeping that
//!    invariant, and exported.
//!
//! ## Architecture
//!
//! - `config`: typed configuration (sizes, nations, model parameters, overrides)
//! - `config_loader`: YAML/JSON configuration loading
//! - `nation`: nation tables and the proportional allocator
//! - `model`: node and subnetwork vocabulary, and the subnetwork catalog
//! - `rnd`: seeded random streams, distributions, topology and attribute generators
//! - `network`: instantiation, composition, balances, scaling and post-processing
//! - `export`: JSON, YAML and GML writers
//! - `utils`: amount decoding, naming and validation helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use plasmagen::config::{Config, NationsConfig, SizeSpec};
//! use plasmagen::model::payment_subnetwork_models;
//! use plasmagen::network::{generate_plasma_network, postprocess, scale_to_fractions};
//!
//! let config = Config {
//!     nations: NationsConfig::List(vec!["IT".into(), "FR".into()]),
//!     size: SizeSpec::from_counts(2, 10, 1000, 100),
//!     ..Config::default()
//! };
//! let specs = config.nation_specs()?;
//! let size = config.network_size(specs.nb_nations())?;
//! let counts = size.layer_counts(&specs, config.unique_cb)?;
//! let catalog = payment_subnetwork_models(&counts, &config.model, &config.overrides, config.unique_cb)?;
//! let (mut network, _) = generate_plasma_network(&catalog, config.seed, &specs, config.unique_cb)?;
//! postprocess(&mut network, None)?;
//! let copies = scale_to_fractions(&network, &[0.5, 1.0])?;
//! assert_eq!(copies.len(), 2);
//! # Ok::<(), plasmagen::error::GeneratorError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`error::GeneratorError`] for invalid parameters.
//! Broken internal invariants (a channel whose balances do not add up to its
//! capacity) panic. The loader, the exporters and the binary use `color_eyre`
//! for error reporting with context.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod export;
pub mod model;
pub mod nation;
pub mod network;
pub mod rnd;
pub mod utils;
