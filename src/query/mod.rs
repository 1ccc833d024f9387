// Submodules for separation of concerns: the operator library (pure
// functions over materialized elements), the replay engine, and the
// expression-queue types.
pub(crate) mod eval;
pub(crate) mod exec;
pub mod types;

pub use eval::compare_values;
pub use exec::evaluate;
pub use types::{
    Comparer, Defaults, EqualityComparer, IndexedPredicate, KeySelector, Predicate, QueryOp,
    ResultSelector, Selector, comparer, equality, indexed_predicate, key_selector, predicate,
    result_selector, selector,
};
