//! Error types for network generation.
//!
//! Every variant of [`GeneratorError`] is a configuration or validation
//! failure: the caller supplied parameters that cannot produce a network and
//! must fix them. Logic defects inside the generator (a channel whose two
//! directions disagree on capacity, a broken balance split, mismatched nation
//! keys when merging partial allocations) are not represented here; they are
//! asserted and abort generation.

/// Configuration and validation errors raised before or during generation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeneratorError {
    #[error("{name} is not a valid nation name (expected uppercase letters only)")]
    InvalidNationName { name: String },

    #[error("the nation code {name} is reserved")]
    ReservedNationCode { name: String },

    #[error("{spec} is not a valid nation specification string: {reason}")]
    InvalidNationSpec { spec: String, reason: String },

    #[error("duplicate nation names: {names}")]
    DuplicateNations { names: String },

    #[error("the nation specs must not be empty")]
    EmptyNations,

    #[error("unknown nation id: {name}")]
    UnknownNation { name: String },

    #[error("relative size {value} of nation {name} is not between 0.0 and 1.0")]
    RelativeSizeOutOfRange { name: String, value: f64 },

    #[error("the sum of the relative sizes of the nations must be 1.0, got {sum}")]
    RelativeSizesNotNormalized { sum: f64 },

    #[error("the sum of the relative sizes of the nations in the overrides is greater than 1.0: {sum}")]
    OverridesExceedUnity { sum: f64 },

    #[error("the number of intermediaries ({intermediaries}) cannot be smaller than the number of nations ({nations})")]
    TooFewIntermediaries { intermediaries: usize, nations: usize },

    #[error("the probabilities of having small, medium and large merchants must sum to 1, got {sum}")]
    MerchantProbabilities { sum: f64 },

    #[error("cannot create a beta distribution for min={min}, max={max}, mean={mean}, dev={dev}")]
    InfeasibleBeta { min: f64, max: f64, mean: f64, dev: f64 },

    #[error("probability {name}={value} is not between 0.0 and 1.0")]
    InvalidProbability { name: String, value: f64 },

    #[error("invalid distribution parameter: {0}")]
    InvalidDistribution(String),

    #[error("invalid discrete distribution: {0}")]
    InvalidDiscreteDistribution(String),

    #[error("attribute {label} cannot take value {value}")]
    AttributeTypeMismatch { label: String, value: String },

    #[error("expected {expected} values for attributes, got {got}")]
    AttributeArity { expected: usize, got: usize },

    #[error("the nations list is empty, at least one nation is required")]
    EmptyNationList,

    #[error("capacity fraction {0} is not between 0.0 and 1.0")]
    InvalidCapacityFraction(f64),

    #[error("cannot partition a network into {0} buckets")]
    InvalidPartitionCount(usize),

    #[error("invalid size specification: {0}")]
    InvalidSize(String),

    #[error("unknown export format {name}; choose one of {supported}")]
    UnknownExportFormat { name: String, supported: String },

    #[error("{0} is not a valid amount")]
    InvalidAmount(String),

    #[error("unknown subnetwork type {label}")]
    UnknownSubnetwork { label: String },

    #[error("invalid model override {assignment}: {reason}")]
    InvalidOverride { assignment: String, reason: String },
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, GeneratorError>;
