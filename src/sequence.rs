use std::fmt;
use std::rc::Rc;

use crate::errors::Error;
use crate::query::eval;
use crate::query::exec;
use crate::query::types::{
    Comparer, Defaults, EqualityComparer, IndexedPredicate, KeySelector, Predicate, QueryOp,
    ResultSelector, Selector,
};
use crate::value::{Dictionary, Group, KeyValuePair, Value};

/// Construction input for [`Sequence::create`]. The collection/single-value
/// distinction is a compile-time tag rather than a runtime type probe:
/// a `Collection` contributes its items, `One` wraps any value (an array
/// included) as a one-element sequence, and `Empty` is the empty sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Empty,
    One(Value),
    Collection(Vec<Value>),
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Source::One(value)
    }
}

impl From<Vec<Value>> for Source {
    fn from(values: Vec<Value>) -> Self {
        Source::Collection(values)
    }
}

/// A deferred, chainable query over a finite in-memory snapshot.
///
/// A sequence holds an immutable base snapshot plus a queue of pending
/// operations. Chaining methods never evaluate anything and never mutate the
/// receiver; they return a new sequence whose queue is the receiver's plus
/// one entry. Terminal methods replay the queue against the base snapshot
/// and return a concrete value, which is why they all return `Result`:
/// argument validation inside the queue (a strict `take`, a negative reverse
/// count) only surfaces once something forces evaluation.
#[derive(Clone)]
pub struct Sequence {
    elements: Rc<Vec<Value>>,
    ops: Vec<QueryOp>,
    defaults: Defaults,
}

impl Sequence {
    /// The empty sequence.
    pub fn new() -> Self {
        Self::with_elements(Vec::new())
    }

    pub fn create(source: Source) -> Self {
        match source {
            Source::Empty => Self::new(),
            Source::One(value) => Self::with_elements(vec![value]),
            Source::Collection(values) => Self::with_elements(values),
        }
    }

    /// `count` consecutive integers starting at `start`.
    pub fn range(start: i64, count: i64) -> Result<Self, Error> {
        if count < 0 {
            return Err(Error::CountOutOfRange(count));
        }
        Ok(Self::with_elements((start..start + count).map(Value::from).collect()))
    }

    /// `count` copies of `item`.
    pub fn repeat(item: Value, count: i64) -> Result<Self, Error> {
        if count < 0 {
            return Err(Error::CountOutOfRange(count));
        }
        Ok(Self::with_elements(vec![item; count as usize]))
    }

    /// A sequence of `{key, value}` pairs from a JSON mapping.
    pub fn from_mapping(mapping: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self::with_elements(
            mapping
                .iter()
                .map(|(k, v)| {
                    Value::from(KeyValuePair {
                        key: Value::String(k.clone()),
                        value: Value::from(v.clone()),
                    })
                })
                .collect(),
        )
    }

    fn with_elements(elements: Vec<Value>) -> Self {
        Sequence { elements: Rc::new(elements), ops: Vec::new(), defaults: Defaults::default() }
    }

    /// Swaps the injectable defaults record the chain falls back to whenever
    /// an optional comparer or selector is omitted.
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub(crate) fn snapshot(&self) -> &[Value] {
        &self.elements
    }

    pub(crate) fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// The pending, not-yet-applied operations of this sequence.
    pub fn pending_operations(&self) -> &[QueryOp] {
        &self.ops
    }

    fn append(&self, op: QueryOp) -> Sequence {
        let mut ops = self.ops.clone();
        ops.push(op);
        Sequence { elements: Rc::clone(&self.elements), ops, defaults: self.defaults.clone() }
    }

    // --- deferred operators ---

    /// Keeps elements the predicate answers true for. The predicate sees the
    /// element only, not its index.
    pub fn where_<F>(&self, predicate: F) -> Sequence
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.append(QueryOp::Where { predicate: Rc::new(predicate) })
    }

    /// Projects each element through `selector(element, index)`.
    pub fn select<F>(&self, selector: F) -> Sequence
    where
        F: Fn(&Value, usize) -> Value + 'static,
    {
        self.append(QueryOp::Select { selector: Rc::new(selector) })
    }

    /// Projects each element to a sub-sequence and flattens. An array result
    /// contributes its items, anything else contributes itself. With a
    /// result selector, yields `result(original, flattened)` instead of the
    /// flattened element.
    pub fn select_many<F>(&self, collection: F, result: Option<ResultSelector>) -> Sequence
    where
        F: Fn(&Value, usize) -> Value + 'static,
    {
        self.append(QueryOp::SelectMany { collection: Rc::new(collection), result })
    }

    pub fn distinct(&self, comparer: Option<EqualityComparer>) -> Sequence {
        self.append(QueryOp::Distinct { comparer })
    }

    /// Elements of this sequence not contained in `second`.
    pub fn except(&self, second: &Sequence, comparer: Option<EqualityComparer>) -> Sequence {
        self.append(QueryOp::Except { second: second.clone(), comparer })
    }

    /// Elements of this sequence contained in `second`.
    pub fn intersect(&self, second: &Sequence, comparer: Option<EqualityComparer>) -> Sequence {
        self.append(QueryOp::Intersect { second: second.clone(), comparer })
    }

    /// Distinct elements of both sequences, in first-seen order.
    pub fn union(&self, second: &Sequence, comparer: Option<EqualityComparer>) -> Sequence {
        self.append(QueryOp::Union { second: second.clone(), comparer })
    }

    pub fn concat(&self, second: &Sequence) -> Sequence {
        self.append(QueryOp::Concat { second: second.clone() })
    }

    /// Groups elements by `key(element)` into `Value::Group` entries, keyed
    /// by first-seen key, in first-seen key order.
    pub fn group_by<F>(&self, key: F, comparer: Option<EqualityComparer>) -> Sequence
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.append(QueryOp::GroupBy { key: Rc::new(key), comparer })
    }

    /// Stable ascending sort by `comparer(key(a), key(b))`; omitted arguments
    /// fall back to the defaults record.
    pub fn order_by(&self, key: Option<KeySelector>, comparer: Option<Comparer>) -> Sequence {
        self.append(QueryOp::OrderBy { key, comparer })
    }

    /// Ascending sort followed by a full reversal. Ties therefore come out
    /// reversed relative to `order_by`, and that behavior is contractual.
    pub fn order_by_descending(
        &self,
        key: Option<KeySelector>,
        comparer: Option<Comparer>,
    ) -> Sequence {
        self.append(QueryOp::OrderByDescending { key, comparer })
    }

    /// Secondary sort keys are deliberately unsupported.
    pub fn then_by(
        &self,
        _key: Option<KeySelector>,
        _comparer: Option<Comparer>,
    ) -> Result<Sequence, Error> {
        Err(Error::NotImplemented("then_by"))
    }

    /// Secondary sort keys are deliberately unsupported.
    pub fn then_by_descending(
        &self,
        _key: Option<KeySelector>,
        _comparer: Option<Comparer>,
    ) -> Result<Sequence, Error> {
        Err(Error::NotImplemented("then_by_descending"))
    }

    /// Reverses the whole sequence.
    pub fn reverse(&self) -> Sequence {
        self.append(QueryOp::Reverse { index: 0, count: None })
    }

    /// Reverses `[index, index+count)`, clamped to the sequence, leaving the
    /// head and tail in place. A negative count fails at evaluation time.
    pub fn reverse_range(&self, index: usize, count: i64) -> Sequence {
        self.append(QueryOp::Reverse { index, count: Some(count) })
    }

    /// Bypasses `count` elements; skipping past the end yields empty.
    pub fn skip(&self, count: usize) -> Sequence {
        self.append(QueryOp::Skip { count })
    }

    /// Bypasses elements while `predicate(element, index)` holds, then keeps
    /// everything from the first falsy answer on.
    pub fn skip_while<F>(&self, predicate: F) -> Sequence
    where
        F: Fn(&Value, usize) -> bool + 'static,
    {
        self.append(QueryOp::SkipWhile { predicate: Rc::new(predicate) })
    }

    /// The first `count` elements; taking more than exist fails at
    /// evaluation time.
    pub fn take(&self, count: usize) -> Sequence {
        self.append(QueryOp::Take { count })
    }

    /// Keeps elements until `predicate(element, index)` first answers false.
    pub fn take_while<F>(&self, predicate: F) -> Sequence
    where
        F: Fn(&Value, usize) -> bool + 'static,
    {
        self.append(QueryOp::TakeWhile { predicate: Rc::new(predicate) })
    }

    // --- terminal operators ---

    /// Replays the pending operations against the base snapshot and returns
    /// the materialized elements.
    pub fn to_vec(&self) -> Result<Vec<Value>, Error> {
        exec::evaluate(self)
    }

    /// Replays the pending operations and wraps the result as a fresh,
    /// queue-less sequence carrying the same defaults.
    pub fn execute(&self) -> Result<Sequence, Error> {
        Ok(Sequence {
            elements: Rc::new(self.to_vec()?),
            ops: Vec::new(),
            defaults: self.defaults.clone(),
        })
    }

    /// True when every element satisfies `predicate(element, index)`.
    pub fn all<F>(&self, predicate: F) -> Result<bool, Error>
    where
        F: Fn(&Value, usize) -> bool + 'static,
    {
        Ok(eval::all(&self.to_vec()?, &predicate))
    }

    /// With a predicate, true when any element satisfies it; without one,
    /// true when the sequence is non-empty.
    pub fn any(&self, predicate: Option<IndexedPredicate>) -> Result<bool, Error> {
        Ok(eval::any(&self.to_vec()?, predicate.as_deref()))
    }

    /// Sum of selected values divided by element count; empty sources yield
    /// the non-finite NaN.
    pub fn average(&self, selector: Option<Selector>) -> Result<f64, Error> {
        let elements = self.to_vec()?;
        Ok(eval::average(&elements, &*self.pick_selector(selector)))
    }

    pub fn contains(
        &self,
        element: &Value,
        comparer: Option<EqualityComparer>,
    ) -> Result<bool, Error> {
        let elements = self.to_vec()?;
        Ok(eval::contains(&elements, element, &*self.pick_equality(comparer)))
    }

    pub fn count(&self, predicate: Option<IndexedPredicate>) -> Result<usize, Error> {
        Ok(eval::count(&self.to_vec()?, predicate.as_deref()))
    }

    /// `Ok(None)` when the index is out of bounds.
    pub fn element_at(&self, index: usize) -> Result<Option<Value>, Error> {
        Ok(eval::element_at(&self.to_vec()?, index))
    }

    /// The first element, or the first satisfying `predicate(element,
    /// index)`; `Ok(None)` when nothing matches.
    pub fn first(&self, predicate: Option<IndexedPredicate>) -> Result<Option<Value>, Error> {
        Ok(eval::first(&self.to_vec()?, predicate.as_deref()))
    }

    pub fn first_or_default(
        &self,
        predicate: Option<IndexedPredicate>,
        default: Value,
    ) -> Result<Value, Error> {
        Ok(self.first(predicate)?.unwrap_or(default))
    }

    /// Index of the first element equal to `item` within `[start, end)`,
    /// both bounds clamped; `Ok(None)` when absent.
    pub fn index_of(
        &self,
        item: &Value,
        start: Option<usize>,
        end: Option<usize>,
    ) -> Result<Option<usize>, Error> {
        Ok(eval::index_of(&self.to_vec()?, item, start, end))
    }

    /// The last element, or the last satisfying the predicate: the scan
    /// covers the whole sequence so the last match wins.
    pub fn last(&self, predicate: Option<IndexedPredicate>) -> Result<Option<Value>, Error> {
        Ok(eval::last(&self.to_vec()?, predicate.as_deref()))
    }

    pub fn last_or_default(
        &self,
        predicate: Option<IndexedPredicate>,
        default: Value,
    ) -> Result<Value, Error> {
        Ok(self.last(predicate)?.unwrap_or(default))
    }

    /// The greatest `selector(element, index)` value under the default
    /// comparer; fails on an empty source.
    pub fn max(&self, selector: Option<Selector>) -> Result<Value, Error> {
        let elements = self.to_vec()?;
        eval::max(&elements, &*self.pick_selector(selector), &*self.defaults.comparer)
    }

    /// The least selected value; fails on an empty source.
    pub fn min(&self, selector: Option<Selector>) -> Result<Value, Error> {
        let elements = self.to_vec()?;
        eval::min(&elements, &*self.pick_selector(selector), &*self.defaults.comparer)
    }

    /// Position-wise equality of both materialized sequences.
    pub fn sequence_equal(
        &self,
        second: &Sequence,
        comparer: Option<EqualityComparer>,
    ) -> Result<bool, Error> {
        let first = self.to_vec()?;
        let second = second.to_vec()?;
        Ok(eval::sequence_equal(&first, &second, &*self.pick_equality(comparer)))
    }

    /// The only element (optionally, the only one matching the element-only
    /// predicate); anything other than exactly one is an error.
    pub fn single(&self, predicate: Option<Predicate>) -> Result<Value, Error> {
        eval::single(&self.to_vec()?, predicate.as_deref())
    }

    /// Folds `+` over selected values coerced to numbers.
    pub fn sum(&self, selector: Option<Selector>) -> Result<f64, Error> {
        let elements = self.to_vec()?;
        Ok(eval::sum(&elements, &*self.pick_selector(selector)))
    }

    /// Builds an insertion-ordered dictionary; a duplicate key under the
    /// comparer is an error.
    pub fn to_dictionary<F>(
        &self,
        key: F,
        element: Option<Selector>,
        comparer: Option<EqualityComparer>,
    ) -> Result<Dictionary, Error>
    where
        F: Fn(&Value) -> Value + 'static,
    {
        let elements = self.to_vec()?;
        eval::to_dictionary(
            &elements,
            &key,
            &*self.pick_selector(element),
            &*self.pick_equality(comparer),
        )
    }

    /// Evaluates, then invokes `callback(element, index)` for every element.
    pub fn each<F>(&self, mut callback: F) -> Result<(), Error>
    where
        F: FnMut(&Value, usize),
    {
        for (i, element) in self.to_vec()?.iter().enumerate() {
            callback(element, i);
        }
        Ok(())
    }

    fn pick_selector(&self, chosen: Option<Selector>) -> Selector {
        chosen.unwrap_or_else(|| self.defaults.element_selector.clone())
    }

    fn pick_equality(&self, chosen: Option<EqualityComparer>) -> EqualityComparer {
        chosen.unwrap_or_else(|| self.defaults.equality.clone())
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for Sequence {
    fn from(values: Vec<Value>) -> Self {
        Self::with_elements(values)
    }
}

impl FromIterator<Value> for Sequence {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::with_elements(iter.into_iter().collect())
    }
}

/// A group's sub-sequence view over its member elements.
impl From<&Group> for Sequence {
    fn from(group: &Group) -> Self {
        Self::with_elements(group.values.clone())
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("elements", &self.elements.len())
            .field("pending", &self.ops)
            .finish()
    }
}
