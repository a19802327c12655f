//! Sequential transform over an element sequence.

use crate::context::Context;
use crate::error::ProcessingResult;
use crate::processing::function::Transform;

/// Returns a new sequence by applying `f` to every element, in index order.
///
/// The context is checked before each call. The first error (from `f` or from
/// cancellation) aborts the whole operation; no partial output is returned.
pub fn transform<T, U, F>(ctx: &Context, f: &F, items: &[T]) -> ProcessingResult<Vec<U>>
where
    F: Transform<T, U> + ?Sized,
{
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        ctx.check()?;
        out.push(f.call(ctx, item)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::transform;
    use crate::context::Context;
    use crate::error::{ProcessingError, ProcessingResult};
    use crate::processing::function::function;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn transform_maps_every_element_in_order() {
        let ctx = Context::new();
        let out = transform(
            &ctx,
            &function(|_: &Context, s: &&str| Ok(s.to_uppercase())),
            &["a", "b", "c"],
        )
        .unwrap();
        assert_eq!(out, vec!["A", "B", "C"]);
    }

    #[test]
    fn transform_of_empty_input_is_empty() {
        let ctx = Context::new();
        let out: Vec<i64> =
            transform(&ctx, &function(|_: &Context, x: &i64| Ok(*x)), &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn transform_stops_at_first_error() {
        let ctx = Context::new();
        let calls = AtomicUsize::new(0);
        let f = function(|_: &Context, x: &i64| -> ProcessingResult<i64> {
            calls.fetch_add(1, Ordering::SeqCst);
            if *x == 2 {
                Err(ProcessingError::msg("two is not allowed"))
            } else {
                Ok(*x)
            }
        });

        let err = transform(&ctx, &f, &[0, 1, 2, 3, 4]).unwrap_err();
        assert_eq!(err.to_string(), "two is not allowed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn transform_observes_cancellation_between_elements() {
        let ctx = Context::new();
        let f = function(|ctx: &Context, x: &i64| {
            if *x == 1 {
                ctx.cancel();
            }
            Ok(*x)
        });
        let err = transform(&ctx, &f, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, ProcessingError::Cancelled));
    }

    #[test]
    fn transform_is_deterministic() {
        let ctx = Context::new();
        let f = function(|_: &Context, x: &i64| Ok(x * x - 3));
        let items: Vec<i64> = (0..50).collect();
        assert_eq!(
            transform(&ctx, &f, &items).unwrap(),
            transform(&ctx, &f, &items).unwrap()
        );
    }
}
