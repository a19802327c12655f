//! Sequential engines over element sequences.
//!
//! Every engine takes a [`Context`](crate::context::Context), the capability to apply, and
//! the input slice. They run on the calling thread, check the context before each element,
//! and stop at the first error without returning partial output.
//!
//! Currently implemented:
//!
//! - [`transform()`]: element-wise mapping by a [`Transform`]
//! - [`filter()`], [`reject()`], [`any()`], [`all()`]: selection by a [`Predicate`]
//! - [`reduce()`], [`fold()`], [`key_by()`], [`key_value_by()`]: left folds by a [`Combine`]
//!
//! For the parallel counterpart of [`transform()`] see [`crate::execution`].
//!
//! ## Example: filter → transform → reduce
//!
//! ```rust
//! use rust_funcutil::context::Context;
//! use rust_funcutil::processing::{combiner, filter, function, predicate, reduce, transform};
//!
//! let ctx = Context::new();
//! let items: Vec<i64> = (0..10).collect();
//!
//! let odd = filter(&ctx, &predicate(|_: &Context, x: &i64| Ok(x % 2 == 1)), &items)?;
//! let squared = transform(&ctx, &function(|_: &Context, x: &i64| Ok(x * x)), &odd)?;
//! let total = reduce(&ctx, &combiner(|_: &Context, a: i64, b: &i64| Ok(a + b)), None, &squared)?;
//!
//! assert_eq!(total, Some(1 + 9 + 25 + 49 + 81));
//! # Ok::<(), rust_funcutil::ProcessingError>(())
//! ```

pub mod filter;
pub mod function;
pub mod map;
pub mod predicate;
pub mod reduce;

pub use filter::{all, any, filter, reject};
pub use function::{
    Apply, BoxTransform, Combine, Compose, FnCombine, FnTransform, Transform, apply, combiner,
    compose, function,
};
pub use map::transform;
pub use predicate::{
    And, BoxPredicate, FnPredicate, Not, Or, Predicate, and, not, or, or_strict, predicate,
};
pub use reduce::{fold, key_by, key_value_by, reduce};
