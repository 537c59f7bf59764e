//! Index maintenance primitives. Each derived index lives under its own key
//! namespace of the shared store and is updated incrementally.

pub mod lookup;
pub mod merge;
pub mod postings;

pub use lookup::{
    fetch_existing_page, fetch_page, lookup_by_keys, lookup_terms, single_lookup,
    term_range_lookup, LookupResult,
};
pub use merge::merge_documents;
pub use postings::{reduce_term_value, TermField};
