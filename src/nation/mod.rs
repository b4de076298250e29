//! Nations and the allocation of node counts across them.

pub mod allocator;
pub mod spec;

pub use allocator::{
    allocate, allocate_intermediaries, allocate_merchants, central_bank_counts, MerchantCounts,
    NationCounts,
};
pub use spec::{NationSpec, NationSpecs, EU_COUNTRY_CODE};
