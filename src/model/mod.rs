//! Node and subnetwork models.
//!
//! [`types`] holds the vocabulary shared by the whole generator and
//! [`catalog`] assembles the subnetwork descriptors from model parameters.

pub mod catalog;
pub mod types;

pub use catalog::{payment_subnetwork_models, Catalog, LayerCounts};
pub use types::{
    AttributeModel, AttributeRule, AttributeValue, ChannelType, EdgeAttribute, EdgeKeyTemplate, LabelTemplate,
    NodeGroup, NodeType, SubnetworkKind, SubnetworkModel, TopologyModel,
};
