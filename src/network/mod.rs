//! Concrete networks: instantiation, composition, balances, scaling and
//! post-processing.

pub mod balance;
pub mod compose;
pub mod instantiate;
pub mod partition;
pub mod postprocess;
pub mod scale;
pub mod types;

pub use compose::{compose, generate_plasma_network};
pub use instantiate::instantiate_subnetwork;
pub use partition::{approx_max_cut, assign_deploy_buckets};
pub use postprocess::postprocess;
pub use scale::{scale_capacities, scale_to_fractions};
pub use types::{Edge, FeeSchedule, Node, PlasmaNetwork, Subnetwork, SubnetworkNode};
