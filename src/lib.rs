//! `rust-funcutil` is a small toolkit of composable operations over element sequences:
//! transform, filter, reduce and predicate combinators, plus a bounded-parallelism transform
//! engine that preserves input order and stops promptly on the first error.
//!
//! Every operation takes a [`context::Context`], a capability (a [`processing::Transform`],
//! [`processing::Predicate`] or [`processing::Combine`]) and an input slice. Elements are a
//! generic type parameter; [`types::Value`] is available for pipelines whose element kinds
//! are only known at runtime, together with the ready-made [`combinators`].
//!
//! ## Sequential engines
//!
//! ```rust
//! use rust_funcutil::combinators::{gt, lt, sum};
//! use rust_funcutil::context::Context;
//! use rust_funcutil::processing::{and, filter, not, reduce, Predicate};
//! use rust_funcutil::types::Value;
//!
//! # fn main() -> Result<(), rust_funcutil::ProcessingError> {
//! let ctx = Context::new();
//! let items: Vec<Value> = (0..8).map(Value::from).collect();
//!
//! let outside = not(and(vec![gt(2).boxed(), lt(5).boxed()]));
//! let kept = filter(&ctx, &outside, &items)?;
//! assert_eq!(kept, [0, 1, 2, 5, 6, 7].map(Value::from));
//!
//! let total = reduce(&ctx, &sum(), None, &kept)?;
//! assert_eq!(total, Some(Value::Int64(21)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Parallel transform
//!
//! [`execution::parallel_transform`] runs a transform on a fixed number of worker threads.
//! Results are placed by input index, so the output equals the sequential
//! [`processing::transform`] for any error-free function. The first error cancels the run:
//! no new elements are dispatched, calls already in flight finish, and the error is
//! returned without partial output. Cancelling the caller's context has the same effect and
//! returns [`ProcessingError::Cancelled`].
//!
//! ```rust
//! use rust_funcutil::context::Context;
//! use rust_funcutil::execution::parallel_transform;
//! use rust_funcutil::processing::function;
//! use rust_funcutil::ProcessingError;
//!
//! let ctx = Context::new();
//! let items: Vec<i64> = (1..=100).collect();
//!
//! let squares = parallel_transform(&ctx, 4, &function(|_: &Context, x: &i64| Ok(x * x)), &items)?;
//! assert_eq!(squares[9], 100);
//!
//! let failing = function(|_: &Context, x: &i64| {
//!     if *x == 50 {
//!         Err(ProcessingError::msg("fifty"))
//!     } else {
//!         Ok(*x)
//!     }
//! });
//! assert!(parallel_transform(&ctx, 4, &failing, &items).is_err());
//! # Ok::<(), ProcessingError>(())
//! ```
//!
//! ## Modules
//!
//! - [`processing`]: sequential transform/filter/reduce engines and capability traits
//! - [`execution`]: bounded-parallelism transform engine, observer and metrics hooks
//! - [`context`]: cancellation and deadline carrier
//! - [`combinators`]: arithmetic, string and comparison combinators over [`types::Value`]
//! - [`types`]: dynamically-typed element values
//! - [`error`]: error type used across the crate

pub mod combinators;
pub mod context;
pub mod error;
pub mod execution;
pub mod processing;
pub mod types;

pub use error::{BoxError, ProcessingError, ProcessingResult};
