pub mod errors;
pub mod query;
pub mod sequence;
pub mod value;

pub use errors::Error;
pub use query::{
    Comparer, Defaults, EqualityComparer, IndexedPredicate, KeySelector, Predicate, QueryOp,
    ResultSelector, Selector, comparer, compare_values, equality, indexed_predicate, key_selector,
    predicate, result_selector, selector,
};
pub use sequence::{Sequence, Source};
pub use value::{Dictionary, Group, KeyValuePair, Value};

/// Builds a sequence from a construction source: a collection contributes
/// its items, a single value of any shape wraps as a one-element sequence,
/// and `Source::Empty` is the empty sequence.
pub fn create(source: impl Into<Source>) -> Sequence {
    Sequence::create(source.into())
}

/// A sequence of `count` consecutive integers starting at `start`; a
/// negative count is an error.
pub fn range(start: i64, count: i64) -> Result<Sequence, Error> {
    Sequence::range(start, count)
}

/// A sequence of `count` copies of `item`; a negative count is an error.
pub fn repeat(item: Value, count: i64) -> Result<Sequence, Error> {
    Sequence::repeat(item, count)
}

/// A sequence of `{key, value}` pairs from a JSON mapping.
pub fn from_mapping(mapping: &serde_json::Map<String, serde_json::Value>) -> Sequence {
    Sequence::from_mapping(mapping)
}
