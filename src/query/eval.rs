use ordered_float::OrderedFloat;
use std::cmp::Ordering;

use crate::errors::Error;
use crate::value::{Dictionary, Group, Value};

/// The default three-way comparer: `Null` sorts before any defined value,
/// numbers are ordered totally, strings and bools by natural order, and
/// mixed types fall back to a fixed type rank.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    match (a, b) {
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => OrderedFloat(*x).cmp(&OrderedFloat(*y)),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
        Value::Pair(_) => 6,
        Value::Group(_) => 7,
    }
}

pub fn filter(elements: &[Value], predicate: &dyn Fn(&Value) -> bool) -> Vec<Value> {
    elements.iter().filter(|e| predicate(e)).cloned().collect()
}

pub fn project(elements: &[Value], selector: &dyn Fn(&Value, usize) -> Value) -> Vec<Value> {
    elements.iter().enumerate().map(|(i, e)| selector(e, i)).collect()
}

/// The ensure-sequence coercion: an array contributes its items, any other
/// value contributes itself as a single element.
fn as_elements(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

pub fn flatten(
    elements: &[Value],
    collection: &dyn Fn(&Value, usize) -> Value,
    result: Option<&dyn Fn(&Value, &Value) -> Value>,
) -> Vec<Value> {
    let mut out = Vec::new();
    for (i, element) in elements.iter().enumerate() {
        for item in as_elements(collection(element, i)) {
            out.push(match result {
                Some(result) => result(element, &item),
                None => item,
            });
        }
    }
    out
}

pub fn contains(
    elements: &[Value],
    element: &Value,
    equality: &dyn Fn(&Value, &Value) -> bool,
) -> bool {
    elements.iter().any(|e| equality(e, element))
}

pub fn distinct(elements: &[Value], equality: &dyn Fn(&Value, &Value) -> bool) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for element in elements {
        if !contains(&out, element, equality) {
            out.push(element.clone());
        }
    }
    out
}

/// Elements of `first` not contained in `second`. Duplicates within `first`
/// survive.
pub fn except(
    first: &[Value],
    second: &[Value],
    equality: &dyn Fn(&Value, &Value) -> bool,
) -> Vec<Value> {
    first.iter().filter(|e| !contains(second, e, equality)).cloned().collect()
}

/// Elements of `first` contained in `second`. Duplicates within `first`
/// survive.
pub fn intersect(
    first: &[Value],
    second: &[Value],
    equality: &dyn Fn(&Value, &Value) -> bool,
) -> Vec<Value> {
    first.iter().filter(|e| contains(second, e, equality)).cloned().collect()
}

pub fn union(
    first: &[Value],
    second: &[Value],
    equality: &dyn Fn(&Value, &Value) -> bool,
) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for element in first.iter().chain(second) {
        if !contains(&out, element, equality) {
            out.push(element.clone());
        }
    }
    out
}

/// Groups in first-seen key order; each element joins the first existing
/// group whose key matches under the comparer, else starts a new one.
pub fn group_by(
    elements: &[Value],
    key: &dyn Fn(&Value) -> Value,
    equality: &dyn Fn(&Value, &Value) -> bool,
) -> Vec<Value> {
    let mut groups: Vec<Group> = Vec::new();
    for element in elements {
        let current = key(element);
        match groups.iter_mut().find(|g| equality(&g.key, &current)) {
            Some(group) => group.values.push(element.clone()),
            None => groups.push(Group { key: current, values: vec![element.clone()] }),
        }
    }
    groups.into_iter().map(Value::from).collect()
}

/// Stable ascending sort by `comparer(key(a), key(b))`. Descending order is
/// produced by the engine as this sort followed by a full reversal, which
/// reverses tie order relative to ascending; that exact behavior is part of
/// the contract.
pub fn order_by(
    mut elements: Vec<Value>,
    key: &dyn Fn(&Value) -> Value,
    comparer: &dyn Fn(&Value, &Value) -> Ordering,
) -> Vec<Value> {
    elements.sort_by(|a, b| comparer(&key(a), &key(b)));
    elements
}

/// Reverses `[index, index+count)` clamped to the sequence, keeping head and
/// tail in place. A missing count means "through the end".
pub fn reverse_range(
    elements: &[Value],
    index: usize,
    count: Option<i64>,
) -> Result<Vec<Value>, Error> {
    if let Some(count) = count
        && count < 0
    {
        return Err(Error::CountOutOfRange(count));
    }
    let len = elements.len();
    let start = index.min(len);
    let end = match count {
        Some(count) => start.saturating_add(count as usize).min(len),
        None => len,
    };
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&elements[..start]);
    out.extend(elements[start..end].iter().rev().cloned());
    out.extend_from_slice(&elements[end..]);
    Ok(out)
}

pub fn skip(elements: &[Value], count: usize) -> Vec<Value> {
    elements.iter().skip(count).cloned().collect()
}

/// Once the predicate first answers false, every remaining element is
/// included; the predicate is never consulted again.
pub fn skip_while(elements: &[Value], predicate: &dyn Fn(&Value, usize) -> bool) -> Vec<Value> {
    let mut out = Vec::new();
    let mut keeping = false;
    for (i, element) in elements.iter().enumerate() {
        if !keeping && !predicate(element, i) {
            keeping = true;
        }
        if keeping {
            out.push(element.clone());
        }
    }
    out
}

/// Strict take: requesting more elements than exist is an error, not a clamp.
pub fn take(elements: &[Value], count: usize) -> Result<Vec<Value>, Error> {
    if count > elements.len() {
        return Err(Error::TakeOutOfRange { requested: count, available: elements.len() });
    }
    Ok(elements[..count].to_vec())
}

pub fn take_while(elements: &[Value], predicate: &dyn Fn(&Value, usize) -> bool) -> Vec<Value> {
    let mut out = Vec::new();
    for (i, element) in elements.iter().enumerate() {
        if !predicate(element, i) {
            break;
        }
        out.push(element.clone());
    }
    out
}

pub fn all(elements: &[Value], predicate: &dyn Fn(&Value, usize) -> bool) -> bool {
    elements.iter().enumerate().all(|(i, e)| predicate(e, i))
}

pub fn any(elements: &[Value], predicate: Option<&dyn Fn(&Value, usize) -> bool>) -> bool {
    match predicate {
        Some(predicate) => elements.iter().enumerate().any(|(i, e)| predicate(e, i)),
        None => !elements.is_empty(),
    }
}

pub fn count(elements: &[Value], predicate: Option<&dyn Fn(&Value, usize) -> bool>) -> usize {
    match predicate {
        Some(predicate) => {
            elements.iter().enumerate().filter(|&(i, e)| predicate(e, i)).count()
        }
        None => elements.len(),
    }
}

/// Folds `+` over selected values coerced to `f64`; a non-numeric selection
/// contributes NaN.
pub fn sum(elements: &[Value], selector: &dyn Fn(&Value, usize) -> Value) -> f64 {
    elements
        .iter()
        .enumerate()
        .map(|(i, e)| selector(e, i).as_number().unwrap_or(f64::NAN))
        .sum()
}

/// Sum divided by element count. An empty source divides zero by zero and
/// yields NaN, the contract's non-finite failure mode.
pub fn average(elements: &[Value], selector: &dyn Fn(&Value, usize) -> Value) -> f64 {
    sum(elements, selector) / elements.len() as f64
}

pub fn max(
    elements: &[Value],
    selector: &dyn Fn(&Value, usize) -> Value,
    comparer: &dyn Fn(&Value, &Value) -> Ordering,
) -> Result<Value, Error> {
    fold_extreme(elements, selector, comparer, Ordering::Greater)
}

pub fn min(
    elements: &[Value],
    selector: &dyn Fn(&Value, usize) -> Value,
    comparer: &dyn Fn(&Value, &Value) -> Ordering,
) -> Result<Value, Error> {
    fold_extreme(elements, selector, comparer, Ordering::Less)
}

fn fold_extreme(
    elements: &[Value],
    selector: &dyn Fn(&Value, usize) -> Value,
    comparer: &dyn Fn(&Value, &Value) -> Ordering,
    wanted: Ordering,
) -> Result<Value, Error> {
    let mut best: Option<Value> = None;
    for (i, element) in elements.iter().enumerate() {
        let candidate = selector(element, i);
        best = Some(match best {
            Some(best) if comparer(&candidate, &best) != wanted => best,
            _ => candidate,
        });
    }
    best.ok_or(Error::EmptySequence)
}

pub fn first(
    elements: &[Value],
    predicate: Option<&dyn Fn(&Value, usize) -> bool>,
) -> Option<Value> {
    match predicate {
        Some(predicate) => elements
            .iter()
            .enumerate()
            .find(|&(i, e)| predicate(e, i))
            .map(|(_, e)| e.clone()),
        None => elements.first().cloned(),
    }
}

/// Scans the whole sequence, updating the match on every satisfying element,
/// so the last match wins.
pub fn last(
    elements: &[Value],
    predicate: Option<&dyn Fn(&Value, usize) -> bool>,
) -> Option<Value> {
    match predicate {
        Some(predicate) => {
            let mut found = None;
            for (i, element) in elements.iter().enumerate() {
                if predicate(element, i) {
                    found = Some(element.clone());
                }
            }
            found
        }
        None => elements.last().cloned(),
    }
}

/// Exactly one (matching) element, or an error. The predicate sees the
/// element only, as it routes through the filter contract.
pub fn single(
    elements: &[Value],
    predicate: Option<&dyn Fn(&Value) -> bool>,
) -> Result<Value, Error> {
    let mut matches = elements.iter().filter(|e| predicate.is_none_or(|p| p(e)));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Ok(only.clone()),
        _ => Err(Error::NotSingle),
    }
}

pub fn element_at(elements: &[Value], index: usize) -> Option<Value> {
    elements.get(index).cloned()
}

/// Default-equality scan over `[start, end)`, both bounds clamped.
pub fn index_of(
    elements: &[Value],
    item: &Value,
    start: Option<usize>,
    end: Option<usize>,
) -> Option<usize> {
    let len = elements.len();
    let start = start.unwrap_or(0).min(len);
    let end = end.unwrap_or(len).min(len);
    (start..end).find(|&i| elements[i] == *item)
}

pub fn sequence_equal(
    first: &[Value],
    second: &[Value],
    equality: &dyn Fn(&Value, &Value) -> bool,
) -> bool {
    first.len() == second.len() && first.iter().zip(second).all(|(a, b)| equality(a, b))
}

pub fn to_dictionary(
    elements: &[Value],
    key: &dyn Fn(&Value) -> Value,
    element: &dyn Fn(&Value, usize) -> Value,
    equality: &dyn Fn(&Value, &Value) -> bool,
) -> Result<Dictionary, Error> {
    let mut out = Dictionary::new();
    for (i, item) in elements.iter().enumerate() {
        let k = key(item);
        if out.keys().any(|existing| equality(existing, &k)) {
            return Err(Error::DuplicateKey(format!("{k:?}")));
        }
        out.push(k, element(item, i));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::{Defaults, equality, indexed_predicate, key_selector, selector};

    fn nums(ns: &[i64]) -> Vec<Value> {
        ns.iter().map(|&n| Value::from(n)).collect()
    }

    #[test]
    fn compare_null_sorts_first() {
        assert_eq!(compare_values(&Value::Null, &Value::from(0)), Ordering::Less);
        assert_eq!(compare_values(&Value::from("a"), &Value::Null), Ordering::Greater);
        assert_eq!(compare_values(&Value::from(1), &Value::from(2)), Ordering::Less);
        assert_eq!(compare_values(&Value::from("a"), &Value::from("a")), Ordering::Equal);
    }

    #[test]
    fn distinct_uses_comparer() {
        let elements = nums(&[1, 2, 1, 3, 2]);
        let d = Defaults::default();
        assert_eq!(distinct(&elements, &*d.equality), nums(&[1, 2, 3]));

        // A comparer that treats everything as equal collapses to one element.
        let all_equal = equality(|_, _| true);
        assert_eq!(distinct(&elements, &*all_equal), nums(&[1]));
    }

    #[test]
    fn except_and_intersect_preserve_first_duplicates() {
        let first = nums(&[1, 2, 2, 3]);
        let second = nums(&[2]);
        let d = Defaults::default();
        assert_eq!(except(&first, &second, &*d.equality), nums(&[1, 3]));
        assert_eq!(intersect(&first, &second, &*d.equality), nums(&[2, 2]));
    }

    #[test]
    fn union_dedupes_in_first_seen_order() {
        let d = Defaults::default();
        let out = union(&nums(&[3, 1, 3]), &nums(&[1, 2]), &*d.equality);
        assert_eq!(out, nums(&[3, 1, 2]));
    }

    #[test]
    fn group_by_keeps_first_seen_key_order() {
        let elements = nums(&[1, 2, 3, 4, 5]);
        let d = Defaults::default();
        let by_parity = key_selector(|v| Value::from(v.as_number().unwrap() as i64 % 2));
        let groups = group_by(&elements, &*by_parity, &*d.equality);
        assert_eq!(groups.len(), 2);
        let odd = groups[0].as_group().unwrap();
        assert_eq!(odd.key, Value::from(1));
        assert_eq!(odd.values, nums(&[1, 3, 5]));
        let even = groups[1].as_group().unwrap();
        assert_eq!(even.values, nums(&[2, 4]));
    }

    #[test]
    fn order_by_is_stable() {
        // Sort pairs by first component only; second component records input
        // order.
        let elements: Vec<Value> = [(1, 0), (0, 1), (1, 2), (0, 3)]
            .iter()
            .map(|&(a, b)| Value::Array(nums(&[a, b])))
            .collect();
        let key = key_selector(|v: &Value| v.as_array().unwrap()[0].clone());
        let d = Defaults::default();
        let sorted = order_by(elements, &*key, &*d.comparer);
        let order: Vec<i64> = sorted
            .iter()
            .map(|v| v.as_array().unwrap()[1].as_number().unwrap() as i64)
            .collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn reverse_range_clamps_and_validates() {
        let elements = nums(&[0, 1, 2, 3, 4]);
        assert_eq!(reverse_range(&elements, 0, None).unwrap(), nums(&[4, 3, 2, 1, 0]));
        assert_eq!(reverse_range(&elements, 1, Some(3)).unwrap(), nums(&[0, 3, 2, 1, 4]));
        assert_eq!(reverse_range(&elements, 3, Some(100)).unwrap(), nums(&[0, 1, 2, 4, 3]));
        assert_eq!(reverse_range(&elements, 2, Some(-1)), Err(Error::CountOutOfRange(-1)));
    }

    #[test]
    fn take_is_strict_and_skip_is_not() {
        let elements = nums(&[1, 2, 3]);
        assert_eq!(take(&elements, 2).unwrap(), nums(&[1, 2]));
        assert_eq!(take(&elements, 4), Err(Error::TakeOutOfRange { requested: 4, available: 3 }));
        assert_eq!(skip(&elements, 5), Vec::<Value>::new());
    }

    #[test]
    fn skip_while_never_reenters() {
        // Predicate is true again for the trailing 1s, but skip_while must
        // keep everything from the first falsy answer on.
        let elements = nums(&[1, 1, 5, 1, 1]);
        let small = indexed_predicate(|v, _| v.as_number().unwrap() < 3.0);
        assert_eq!(skip_while(&elements, &*small), nums(&[5, 1, 1]));
        assert_eq!(take_while(&elements, &*small), nums(&[1, 1]));
    }

    #[test]
    fn last_match_wins() {
        let elements = nums(&[1, 2, 3, 2]);
        let is_two = indexed_predicate(|v, _| v.as_number() == Some(2.0));
        assert_eq!(last(&elements, Some(&*is_two)), Some(Value::from(2)));
        assert_eq!(first(&elements, None), Some(Value::from(1)));
        assert_eq!(first(&[], None), None);
    }

    #[test]
    fn single_requires_exactly_one() {
        let d = nums(&[1, 2, 3]);
        assert_eq!(single(&nums(&[7]), None).unwrap(), Value::from(7));
        assert_eq!(single(&d, None), Err(Error::NotSingle));
        assert_eq!(single(&[], None), Err(Error::NotSingle));
        let gt_two = crate::query::types::predicate(|v: &Value| v.as_number().unwrap() > 2.0);
        assert_eq!(single(&d, Some(&*gt_two)).unwrap(), Value::from(3));
    }

    #[test]
    fn max_min_use_selected_values() {
        let d = Defaults::default();
        let elements = nums(&[3, 1, 2]);
        assert_eq!(max(&elements, &*d.element_selector, &*d.comparer).unwrap(), Value::from(3));
        assert_eq!(min(&elements, &*d.element_selector, &*d.comparer).unwrap(), Value::from(1));
        assert_eq!(max(&[], &*d.element_selector, &*d.comparer), Err(Error::EmptySequence));

        let negated = selector(|v, _| Value::from(-v.as_number().unwrap()));
        assert_eq!(max(&elements, &*negated, &*d.comparer).unwrap(), Value::from(-1.0));
    }

    #[test]
    fn average_of_empty_is_nan() {
        let d = Defaults::default();
        assert!(average(&[], &*d.element_selector).is_nan());
        assert_eq!(average(&nums(&[0, 1, 2, 3]), &*d.element_selector), 1.5);
    }

    #[test]
    fn index_of_scans_clamped_window() {
        let elements = nums(&[5, 6, 7, 6]);
        assert_eq!(index_of(&elements, &Value::from(6), None, None), Some(1));
        assert_eq!(index_of(&elements, &Value::from(6), Some(2), None), Some(3));
        assert_eq!(index_of(&elements, &Value::from(6), Some(1), Some(2)), Some(1));
        assert_eq!(index_of(&elements, &Value::from(9), None, Some(100)), None);
    }

    #[test]
    fn to_dictionary_rejects_duplicate_keys() {
        let d = Defaults::default();
        let elements = nums(&[1, 2, 1]);
        let identity = key_selector(|v: &Value| v.clone());
        let err = to_dictionary(&elements, &*identity, &*d.element_selector, &*d.equality);
        assert!(matches!(err, Err(Error::DuplicateKey(_))));

        let ok =
            to_dictionary(&nums(&[1, 2]), &*identity, &*d.element_selector, &*d.equality).unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.get(&Value::from(2)), Some(&Value::from(2)));
    }

    #[test]
    fn flatten_coerces_non_arrays_to_single_elements() {
        let elements = vec![Value::Array(nums(&[1, 2])), Value::from(3)];
        let identity = selector(|v, _| v.clone());
        assert_eq!(flatten(&elements, &*identity, None), nums(&[1, 2, 3]));
    }
}
