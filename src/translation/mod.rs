//! Translation engine
//!
//! - [`query`] renders the SPARQL label queries
//! - [`merge`] folds bindings into one row per (entity, value)
//! - [`first_order`] translates the values of one property
//! - [`second_order`] extends a translation through auxiliary ontologies

pub mod first_order;
pub mod merge;
pub mod query;
pub mod second_order;

pub use first_order::FirstOrderTranslator;
pub use merge::{distinct_pairs, merge_bindings, MergeOptions, ResultMerger};
pub use query::{QueryBuilder, QueryPlan, QueryScope};
pub use second_order::SecondOrderExtender;
