//! Element filtering and quantifiers.

use crate::context::Context;
use crate::error::ProcessingResult;
use crate::processing::predicate::{Predicate, not};

/// Returns the elements for which `predicate` is true, in their original relative order.
///
/// The first predicate error (or cancellation) aborts; no partial output is returned.
pub fn filter<T, P>(ctx: &Context, predicate: &P, items: &[T]) -> ProcessingResult<Vec<T>>
where
    T: Clone,
    P: Predicate<T> + ?Sized,
{
    let mut out = Vec::new();
    for item in items {
        ctx.check()?;
        if predicate.test(ctx, item)? {
            out.push(item.clone());
        }
    }
    Ok(out)
}

/// Returns the elements for which `predicate` is false. Same error policy as [`filter`].
pub fn reject<T, P>(ctx: &Context, predicate: &P, items: &[T]) -> ProcessingResult<Vec<T>>
where
    T: Clone,
    P: Predicate<T> + ?Sized,
{
    filter(ctx, &not(predicate), items)
}

/// True if any element satisfies `predicate`. Stops at the first match; errors propagate.
pub fn any<T, P>(ctx: &Context, predicate: &P, items: &[T]) -> ProcessingResult<bool>
where
    P: Predicate<T> + ?Sized,
{
    for item in items {
        ctx.check()?;
        if predicate.test(ctx, item)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// True if every element satisfies `predicate`. Stops at the first miss; errors propagate.
pub fn all<T, P>(ctx: &Context, predicate: &P, items: &[T]) -> ProcessingResult<bool>
where
    P: Predicate<T> + ?Sized,
{
    for item in items {
        ctx.check()?;
        if !predicate.test(ctx, item)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{all, any, filter, reject};
    use crate::context::Context;
    use crate::error::{ProcessingError, ProcessingResult};
    use crate::processing::predicate::predicate;

    fn sample() -> Vec<i64> {
        (0..8).collect()
    }

    #[test]
    fn filter_keeps_matching_elements_in_order() {
        let ctx = Context::new();
        let even = predicate(|_: &Context, x: &i64| Ok(x % 2 == 0));
        assert_eq!(filter(&ctx, &even, &sample()).unwrap(), vec![0, 2, 4, 6]);
    }

    #[test]
    fn filter_can_return_empty_sequence() {
        let ctx = Context::new();
        let none = predicate(|_: &Context, _: &i64| Ok(false));
        assert!(filter(&ctx, &none, &sample()).unwrap().is_empty());
    }

    #[test]
    fn filter_aborts_on_predicate_error() {
        let ctx = Context::new();
        let picky = predicate(|_: &Context, x: &i64| -> ProcessingResult<bool> {
            if *x == 5 {
                Err(ProcessingError::msg("five"))
            } else {
                Ok(true)
            }
        });
        assert_eq!(filter(&ctx, &picky, &sample()).unwrap_err().to_string(), "five");
    }

    #[test]
    fn filter_stops_when_cancelled() {
        let ctx = Context::new();
        ctx.cancel();
        let yes = predicate(|_: &Context, _: &i64| Ok(true));
        assert!(matches!(
            filter(&ctx, &yes, &sample()),
            Err(ProcessingError::Cancelled)
        ));
    }

    #[test]
    fn reject_drops_matching_elements() {
        let ctx = Context::new();
        let even = predicate(|_: &Context, x: &i64| Ok(x % 2 == 0));
        assert_eq!(reject(&ctx, &even, &sample()).unwrap(), vec![1, 3, 5, 7]);
    }

    #[test]
    fn any_and_all_short_circuit() {
        let ctx = Context::new();
        let big = predicate(|_: &Context, x: &i64| Ok(*x > 6));
        let nonneg = predicate(|_: &Context, x: &i64| Ok(*x >= 0));
        assert!(any(&ctx, &big, &sample()).unwrap());
        assert!(!all(&ctx, &big, &sample()).unwrap());
        assert!(all(&ctx, &nonneg, &sample()).unwrap());
        assert!(!any(&ctx, &big, &[]).unwrap());
        assert!(all(&ctx, &big, &[]).unwrap());
    }
}
