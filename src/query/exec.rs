use crate::errors::Error;
use crate::query::eval;
use crate::query::types::{Comparer, Defaults, EqualityComparer, KeySelector, QueryOp};
use crate::sequence::Sequence;
use crate::value::Value;

/// Replays a sequence's expression queue against its base snapshot: a strict
/// left fold over the queue in insertion order, each step handing its output
/// array to the next. Re-invoking on the same sequence always yields the
/// same result.
pub fn evaluate(sequence: &Sequence) -> Result<Vec<Value>, Error> {
    let ops = sequence.pending_operations();
    let mut current = sequence.snapshot().to_vec();
    if !ops.is_empty() {
        log::trace!("replaying {} pending operation(s) over {} element(s)", ops.len(), current.len());
    }
    for op in ops {
        current = apply(current, op, sequence.defaults())?;
    }
    Ok(current)
}

fn apply(elements: Vec<Value>, op: &QueryOp, defaults: &Defaults) -> Result<Vec<Value>, Error> {
    match op {
        QueryOp::Concat { second } => {
            let mut out = elements;
            out.extend(evaluate(second)?);
            Ok(out)
        }
        QueryOp::Distinct { comparer } => Ok(eval::distinct(&elements, &*eq(comparer, defaults))),
        QueryOp::Except { second, comparer } => {
            Ok(eval::except(&elements, &evaluate(second)?, &*eq(comparer, defaults)))
        }
        QueryOp::GroupBy { key, comparer } => {
            Ok(eval::group_by(&elements, &**key, &*eq(comparer, defaults)))
        }
        QueryOp::Intersect { second, comparer } => {
            Ok(eval::intersect(&elements, &evaluate(second)?, &*eq(comparer, defaults)))
        }
        QueryOp::OrderBy { key, comparer } => {
            Ok(eval::order_by(elements, &*key_of(key, defaults), &*cmp(comparer, defaults)))
        }
        QueryOp::OrderByDescending { key, comparer } => {
            // Ascending sort then full reversal; ties come out reversed.
            let mut out = eval::order_by(elements, &*key_of(key, defaults), &*cmp(comparer, defaults));
            out.reverse();
            Ok(out)
        }
        QueryOp::Reverse { index, count } => eval::reverse_range(&elements, *index, *count),
        QueryOp::Select { selector } => Ok(eval::project(&elements, &**selector)),
        QueryOp::SelectMany { collection, result } => {
            Ok(eval::flatten(&elements, &**collection, result.as_deref()))
        }
        QueryOp::Skip { count } => Ok(eval::skip(&elements, *count)),
        QueryOp::SkipWhile { predicate } => Ok(eval::skip_while(&elements, &**predicate)),
        QueryOp::Take { count } => eval::take(&elements, *count),
        QueryOp::TakeWhile { predicate } => Ok(eval::take_while(&elements, &**predicate)),
        QueryOp::Union { second, comparer } => {
            Ok(eval::union(&elements, &evaluate(second)?, &*eq(comparer, defaults)))
        }
        QueryOp::Where { predicate } => Ok(eval::filter(&elements, &**predicate)),
    }
}

fn eq(chosen: &Option<EqualityComparer>, defaults: &Defaults) -> EqualityComparer {
    chosen.clone().unwrap_or_else(|| defaults.equality.clone())
}

fn cmp(chosen: &Option<Comparer>, defaults: &Defaults) -> Comparer {
    chosen.clone().unwrap_or_else(|| defaults.comparer.clone())
}

fn key_of(chosen: &Option<KeySelector>, defaults: &Defaults) -> KeySelector {
    chosen.clone().unwrap_or_else(|| defaults.key_selector.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Source;

    fn seq(ns: &[i64]) -> Sequence {
        Sequence::create(Source::Collection(ns.iter().map(|&n| Value::from(n)).collect()))
    }

    #[test]
    fn replay_applies_ops_in_insertion_order() {
        let s = seq(&[1, 2, 3, 4, 5, 6])
            .where_(|v| v.as_number().unwrap() % 2.0 == 0.0)
            .select(|v, _| Value::from(v.as_number().unwrap() * 10.0));
        assert_eq!(
            evaluate(&s).unwrap(),
            vec![Value::from(20.0), Value::from(40.0), Value::from(60.0)]
        );
    }

    #[test]
    fn chaining_never_mutates_the_receiver() {
        let base = seq(&[3, 1, 2]);
        let sorted = base.order_by(None, None);
        assert!(base.pending_operations().is_empty());
        assert_eq!(sorted.pending_operations().len(), 1);
        assert_eq!(evaluate(&base).unwrap(), vec![Value::from(3), Value::from(1), Value::from(2)]);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let s = seq(&[5, 3, 5, 1]).distinct(None).order_by(None, None);
        assert_eq!(evaluate(&s).unwrap(), evaluate(&s).unwrap());
    }

    #[test]
    fn replay_failures_surface_from_the_queue() {
        let s = seq(&[1, 2]).take(5);
        assert_eq!(evaluate(&s), Err(Error::TakeOutOfRange { requested: 5, available: 2 }));
    }

    #[test]
    fn second_operand_pipelines_are_evaluated() {
        // The second sequence carries its own pending filter; concat must see
        // the filtered view, not the raw snapshot.
        let second = seq(&[1, 2, 3]).where_(|v| v.as_number().unwrap() > 2.0);
        let s = seq(&[0]).concat(&second);
        assert_eq!(evaluate(&s).unwrap(), vec![Value::from(0), Value::from(3)]);
    }

    #[test]
    fn descending_reverses_ties() {
        // Two elements with equal sort keys: ascending keeps input order
        // (stable sort), descending reverses it wholesale.
        let a = Value::Array(vec![Value::from(1), Value::from("a")]);
        let b = Value::Array(vec![Value::from(1), Value::from("b")]);
        let s = Sequence::create(Source::Collection(vec![a.clone(), b.clone()]));
        let key = crate::query::types::key_selector(|v: &Value| v.as_array().unwrap()[0].clone());
        let asc = evaluate(&s.order_by(Some(key.clone()), None)).unwrap();
        let desc = evaluate(&s.order_by_descending(Some(key), None)).unwrap();
        assert_eq!(asc, vec![a.clone(), b.clone()]);
        assert_eq!(desc, vec![b, a]);
    }
}
