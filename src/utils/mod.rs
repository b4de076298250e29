//! Shared utilities: amount decoding, naming, validation.

pub mod amount;
pub mod naming;
pub mod validation;

pub use amount::{decode_amount, float_round, float_round_up, Amount};
pub use naming::{capacity_dir_name, decimal_digits, idx_to_alphabetical};
pub use validation::{
    sums_to_unity, validate_capacity_fraction, validate_intermediary_count,
    validate_merchant_probabilities, validate_probability,
};
