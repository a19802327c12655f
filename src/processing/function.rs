//! Transform and combine capabilities.
//!
//! Engines accept anything implementing [`Transform`] or [`Combine`]. Closures are adapted
//! with [`function`] and [`combiner`]; boxed trait objects implement both traits so
//! heterogeneous stages can be collected into a `Vec`.

use std::marker::PhantomData;

use crate::context::Context;
use crate::error::ProcessingResult;

/// Maps one element to one element, fallibly.
///
/// Implementations used with [`crate::execution`] are invoked from several threads at
/// once and must be `Sync`.
pub trait Transform<T, U> {
    fn call(&self, ctx: &Context, item: &T) -> ProcessingResult<U>;

    /// Erase the concrete type.
    fn boxed(self) -> BoxTransform<T, U>
    where
        Self: Sized + Send + Sync + 'static,
    {
        Box::new(self)
    }
}

/// Folds an element into an accumulator, fallibly.
///
/// Argument order matters: `call(ctx, acc, item)`.
pub trait Combine<A, T> {
    fn call(&self, ctx: &Context, acc: A, item: &T) -> ProcessingResult<A>;
}

pub type BoxTransform<T, U> = Box<dyn Transform<T, U> + Send + Sync>;

impl<T, U, F> Transform<T, U> for Box<F>
where
    F: Transform<T, U> + ?Sized,
{
    fn call(&self, ctx: &Context, item: &T) -> ProcessingResult<U> {
        (**self).call(ctx, item)
    }
}

impl<T, U, F> Transform<T, U> for &F
where
    F: Transform<T, U> + ?Sized,
{
    fn call(&self, ctx: &Context, item: &T) -> ProcessingResult<U> {
        (**self).call(ctx, item)
    }
}

impl<A, T, F> Combine<A, T> for &F
where
    F: Combine<A, T> + ?Sized,
{
    fn call(&self, ctx: &Context, acc: A, item: &T) -> ProcessingResult<A> {
        (**self).call(ctx, acc, item)
    }
}

/// [`Transform`] backed by a closure. Built with [`function`].
pub struct FnTransform<F, T, U> {
    f: F,
    _types: PhantomData<fn(&T) -> U>,
}

impl<F, T, U> Transform<T, U> for FnTransform<F, T, U>
where
    F: Fn(&Context, &T) -> ProcessingResult<U>,
{
    fn call(&self, ctx: &Context, item: &T) -> ProcessingResult<U> {
        (self.f)(ctx, item)
    }
}

/// Adapt a closure into a [`Transform`].
pub fn function<F, T, U>(f: F) -> FnTransform<F, T, U>
where
    F: Fn(&Context, &T) -> ProcessingResult<U>,
{
    FnTransform {
        f,
        _types: PhantomData,
    }
}

/// [`Combine`] backed by a closure. Built with [`combiner`].
pub struct FnCombine<F, A, T> {
    f: F,
    _types: PhantomData<fn(A, &T) -> A>,
}

impl<F, A, T> Combine<A, T> for FnCombine<F, A, T>
where
    F: Fn(&Context, A, &T) -> ProcessingResult<A>,
{
    fn call(&self, ctx: &Context, acc: A, item: &T) -> ProcessingResult<A> {
        (self.f)(ctx, acc, item)
    }
}

/// Adapt a closure into a [`Combine`].
pub fn combiner<F, A, T>(f: F) -> FnCombine<F, A, T>
where
    F: Fn(&Context, A, &T) -> ProcessingResult<A>,
{
    FnCombine {
        f,
        _types: PhantomData,
    }
}

/// Chain of same-typed transforms applied left to right. Built with [`compose`].
pub struct Compose<T> {
    stages: Vec<BoxTransform<T, T>>,
}

impl<T: Clone> Transform<T, T> for Compose<T> {
    fn call(&self, ctx: &Context, item: &T) -> ProcessingResult<T> {
        let mut current = item.clone();
        for stage in &self.stages {
            current = stage.call(ctx, &current)?;
        }
        Ok(current)
    }
}

/// Run `stages` in order, feeding each output into the next. The first error aborts.
///
/// An empty chain is the identity.
pub fn compose<T>(stages: Vec<BoxTransform<T, T>>) -> Compose<T> {
    Compose { stages }
}

/// A [`Combine`] with its accumulator argument bound. Built with [`apply`].
pub struct Apply<T, C> {
    bound: T,
    combine: C,
}

impl<T, C> Transform<T, T> for Apply<T, C>
where
    T: Clone,
    C: Combine<T, T>,
{
    fn call(&self, ctx: &Context, item: &T) -> ProcessingResult<T> {
        self.combine.call(ctx, self.bound.clone(), item)
    }
}

/// Bind the first argument of `combine`, producing `item -> combine(bound, item)`.
pub fn apply<T, C>(bound: T, combine: C) -> Apply<T, C>
where
    T: Clone,
    C: Combine<T, T>,
{
    Apply { bound, combine }
}
