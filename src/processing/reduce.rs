//! Left-to-right reductions over an element sequence.

use std::collections::HashMap;
use std::hash::Hash;

use crate::context::Context;
use crate::error::ProcessingResult;
use crate::processing::function::{Combine, Transform};

/// Fold `items` into `seed` with `combine`, strictly left to right.
///
/// Returns `seed` unchanged for empty input. The first error aborts the fold.
pub fn fold<A, T, C>(ctx: &Context, combine: &C, seed: A, items: &[T]) -> ProcessingResult<A>
where
    C: Combine<A, T> + ?Sized,
{
    let mut acc = seed;
    for item in items {
        ctx.check()?;
        acc = combine.call(ctx, acc, item)?;
    }
    Ok(acc)
}

/// Reduce `items` with `combine`, optionally starting from `seed`.
///
/// - With a seed, this is [`fold`] and always yields `Some`.
/// - Without a seed, empty input yields `None`, and a single element is returned unchanged
///   without calling `combine`. Otherwise the fold starts with
///   `combine(items[0], &items[1])`.
pub fn reduce<T, C>(
    ctx: &Context,
    combine: &C,
    seed: Option<T>,
    items: &[T],
) -> ProcessingResult<Option<T>>
where
    T: Clone,
    C: Combine<T, T> + ?Sized,
{
    if let Some(seed) = seed {
        return fold(ctx, combine, seed, items).map(Some);
    }
    match items.split_first() {
        None => Ok(None),
        Some((first, rest)) => fold(ctx, combine, first.clone(), rest).map(Some),
    }
}

/// Index `items` by the key computed with `key_fn`.
///
/// A later element with the same key replaces the earlier one.
pub fn key_by<K, T, F>(ctx: &Context, key_fn: &F, items: &[T]) -> ProcessingResult<HashMap<K, T>>
where
    K: Eq + Hash,
    T: Clone,
    F: Transform<T, K> + ?Sized,
{
    let mut out = HashMap::with_capacity(items.len());
    for item in items {
        ctx.check()?;
        out.insert(key_fn.call(ctx, item)?, item.clone());
    }
    Ok(out)
}

/// Like [`key_by`], but stores `value_fn(item)` instead of the element itself.
pub fn key_value_by<K, V, T, KF, VF>(
    ctx: &Context,
    key_fn: &KF,
    value_fn: &VF,
    items: &[T],
) -> ProcessingResult<HashMap<K, V>>
where
    K: Eq + Hash,
    KF: Transform<T, K> + ?Sized,
    VF: Transform<T, V> + ?Sized,
{
    let mut out = HashMap::with_capacity(items.len());
    for item in items {
        ctx.check()?;
        let key = key_fn.call(ctx, item)?;
        let value = value_fn.call(ctx, item)?;
        out.insert(key, value);
    }
    Ok(out)
}
