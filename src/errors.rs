use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("sequence contains no elements")]
    EmptySequence,

    #[error("sequence does not contain exactly one matching element")]
    NotSingle,

    #[error("count is out of range: {0}")]
    CountOutOfRange(i64),

    #[error("cannot take {requested} elements, only {available} available")]
    TakeOutOfRange { requested: usize, available: usize },

    #[error("an item with the same key has already been added: {0}")]
    DuplicateKey(String),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}
