use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::query::eval::compare_values;
use crate::sequence::Sequence;
use crate::value::Value;

// Callable shapes shared by the operator contracts. The evaluation model is
// single-threaded and synchronous, so shared handles are `Rc`.
pub type Predicate = Rc<dyn Fn(&Value) -> bool>;
pub type IndexedPredicate = Rc<dyn Fn(&Value, usize) -> bool>;
pub type Selector = Rc<dyn Fn(&Value, usize) -> Value>;
pub type KeySelector = Rc<dyn Fn(&Value) -> Value>;
pub type ResultSelector = Rc<dyn Fn(&Value, &Value) -> Value>;
pub type EqualityComparer = Rc<dyn Fn(&Value, &Value) -> bool>;
pub type Comparer = Rc<dyn Fn(&Value, &Value) -> Ordering>;

pub fn predicate<F>(f: F) -> Predicate
where
    F: Fn(&Value) -> bool + 'static,
{
    Rc::new(f)
}

pub fn indexed_predicate<F>(f: F) -> IndexedPredicate
where
    F: Fn(&Value, usize) -> bool + 'static,
{
    Rc::new(f)
}

pub fn selector<F>(f: F) -> Selector
where
    F: Fn(&Value, usize) -> Value + 'static,
{
    Rc::new(f)
}

pub fn key_selector<F>(f: F) -> KeySelector
where
    F: Fn(&Value) -> Value + 'static,
{
    Rc::new(f)
}

pub fn result_selector<F>(f: F) -> ResultSelector
where
    F: Fn(&Value, &Value) -> Value + 'static,
{
    Rc::new(f)
}

pub fn equality<F>(f: F) -> EqualityComparer
where
    F: Fn(&Value, &Value) -> bool + 'static,
{
    Rc::new(f)
}

pub fn comparer<F>(f: F) -> Comparer
where
    F: Fn(&Value, &Value) -> Ordering + 'static,
{
    Rc::new(f)
}

/// The comparers and selectors an operator falls back to when the caller
/// passes `None`. Carried per sequence and injectable, so a sequence with
/// custom defaults keeps them through the whole chain.
#[derive(Clone)]
pub struct Defaults {
    pub equality: EqualityComparer,
    pub comparer: Comparer,
    pub key_selector: KeySelector,
    pub element_selector: Selector,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            equality: Rc::new(|a, b| a == b),
            comparer: Rc::new(|a, b| compare_values(a, b)),
            key_selector: Rc::new(|element: &Value| element.clone()),
            element_selector: Rc::new(|element, _| element.clone()),
        }
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Defaults")
    }
}

/// One pending entry of a sequence's expression queue: the operator tag plus
/// its strongly-typed arguments. Binary operators hold the second operand as
/// a full sequence; its own pending pipeline is evaluated during replay.
#[derive(Clone)]
pub enum QueryOp {
    Concat { second: Sequence },
    Distinct { comparer: Option<EqualityComparer> },
    Except { second: Sequence, comparer: Option<EqualityComparer> },
    GroupBy { key: KeySelector, comparer: Option<EqualityComparer> },
    Intersect { second: Sequence, comparer: Option<EqualityComparer> },
    OrderBy { key: Option<KeySelector>, comparer: Option<Comparer> },
    OrderByDescending { key: Option<KeySelector>, comparer: Option<Comparer> },
    Reverse { index: usize, count: Option<i64> },
    Select { selector: Selector },
    SelectMany { collection: Selector, result: Option<ResultSelector> },
    Skip { count: usize },
    SkipWhile { predicate: IndexedPredicate },
    Take { count: usize },
    TakeWhile { predicate: IndexedPredicate },
    Union { second: Sequence, comparer: Option<EqualityComparer> },
    Where { predicate: Predicate },
}

impl QueryOp {
    pub fn name(&self) -> &'static str {
        match self {
            QueryOp::Concat { .. } => "concat",
            QueryOp::Distinct { .. } => "distinct",
            QueryOp::Except { .. } => "except",
            QueryOp::GroupBy { .. } => "group_by",
            QueryOp::Intersect { .. } => "intersect",
            QueryOp::OrderBy { .. } => "order_by",
            QueryOp::OrderByDescending { .. } => "order_by_descending",
            QueryOp::Reverse { .. } => "reverse",
            QueryOp::Select { .. } => "select",
            QueryOp::SelectMany { .. } => "select_many",
            QueryOp::Skip { .. } => "skip",
            QueryOp::SkipWhile { .. } => "skip_while",
            QueryOp::Take { .. } => "take",
            QueryOp::TakeWhile { .. } => "take_while",
            QueryOp::Union { .. } => "union",
            QueryOp::Where { .. } => "where",
        }
    }
}

impl fmt::Debug for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOp::Skip { count } | QueryOp::Take { count } => {
                write!(f, "{}({count})", self.name())
            }
            QueryOp::Reverse { index, count } => match count {
                Some(count) => write!(f, "reverse({index}, {count})"),
                None => write!(f, "reverse({index})"),
            },
            _ => f.write_str(self.name()),
        }
    }
}
