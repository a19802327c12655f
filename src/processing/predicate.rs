//! Boolean tests over elements and their combinators.

use std::marker::PhantomData;

use crate::context::Context;
use crate::error::ProcessingResult;

/// Tests one element, fallibly.
pub trait Predicate<T> {
    fn test(&self, ctx: &Context, item: &T) -> ProcessingResult<bool>;

    /// Erase the concrete type, e.g. to mix predicates in [`and`] / [`or`].
    fn boxed(self) -> BoxPredicate<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        Box::new(self)
    }
}

pub type BoxPredicate<T> = Box<dyn Predicate<T> + Send + Sync>;

impl<T, P> Predicate<T> for Box<P>
where
    P: Predicate<T> + ?Sized,
{
    fn test(&self, ctx: &Context, item: &T) -> ProcessingResult<bool> {
        (**self).test(ctx, item)
    }
}

impl<T, P> Predicate<T> for &P
where
    P: Predicate<T> + ?Sized,
{
    fn test(&self, ctx: &Context, item: &T) -> ProcessingResult<bool> {
        (**self).test(ctx, item)
    }
}

/// [`Predicate`] backed by a closure. Built with [`predicate`].
pub struct FnPredicate<F, T> {
    f: F,
    _types: PhantomData<fn(&T) -> bool>,
}

impl<F, T> Predicate<T> for FnPredicate<F, T>
where
    F: Fn(&Context, &T) -> ProcessingResult<bool>,
{
    fn test(&self, ctx: &Context, item: &T) -> ProcessingResult<bool> {
        (self.f)(ctx, item)
    }
}

/// Adapt a closure into a [`Predicate`].
pub fn predicate<F, T>(f: F) -> FnPredicate<F, T>
where
    F: Fn(&Context, &T) -> ProcessingResult<bool>,
{
    FnPredicate {
        f,
        _types: PhantomData,
    }
}

/// Conjunction. Built with [`and`].
pub struct And<T> {
    members: Vec<BoxPredicate<T>>,
}

impl<T> Predicate<T> for And<T> {
    fn test(&self, ctx: &Context, item: &T) -> ProcessingResult<bool> {
        for member in &self.members {
            if !member.test(ctx, item)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True when every member is true. Stops at the first `false` or error; errors propagate.
pub fn and<T>(members: Vec<BoxPredicate<T>>) -> And<T> {
    And { members }
}

/// Disjunction. Built with [`or`] or [`or_strict`].
pub struct Or<T> {
    members: Vec<BoxPredicate<T>>,
    propagate_errors: bool,
}

impl<T> Predicate<T> for Or<T> {
    fn test(&self, ctx: &Context, item: &T) -> ProcessingResult<bool> {
        for (position, member) in self.members.iter().enumerate() {
            match member.test(ctx, item) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(err) if self.propagate_errors => return Err(err),
                Err(err) => {
                    tracing::debug!(position, error = %err, "or: member error, answering false");
                    return Ok(false);
                }
            }
        }
        Ok(false)
    }
}

/// True when any member is true. Stops at the first `true`.
///
/// A member that fails makes the whole test `false` without consulting later members; its
/// error is dropped (logged at debug level). Use [`or_strict`] to propagate it instead.
pub fn or<T>(members: Vec<BoxPredicate<T>>) -> Or<T> {
    Or {
        members,
        propagate_errors: false,
    }
}

/// Like [`or`], but the first member error aborts the test and is returned.
pub fn or_strict<T>(members: Vec<BoxPredicate<T>>) -> Or<T> {
    Or {
        members,
        propagate_errors: true,
    }
}

/// Negation. Built with [`not`].
pub struct Not<P> {
    inner: P,
}

impl<T, P> Predicate<T> for Not<P>
where
    P: Predicate<T>,
{
    fn test(&self, ctx: &Context, item: &T) -> ProcessingResult<bool> {
        self.inner.test(ctx, item).map(|b| !b)
    }
}

/// Inverts `inner`; errors pass through unchanged.
pub fn not<P>(inner: P) -> Not<P> {
    Not { inner }
}
