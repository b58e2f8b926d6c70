//! Property definition traits for synchronous and asynchronous testing.
//!
//! A property over `n` arguments is an ordinary closure of `n` parameters. [`Predicate`] and
//! [`AsyncPredicate`] bind such closures to the argument tuple the shrinking machinery works
//! with, for every arity from one to six.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;

use crate::error::PropertyError;

/// Values a synchronous property may return.
pub trait PropertyOutcome {
    /// `Ok(())` if the property held
    fn into_result(self) -> Result<(), PropertyError>;
}

impl PropertyOutcome for () {
    fn into_result(self) -> Result<(), PropertyError> {
        Ok(())
    }
}

impl PropertyOutcome for bool {
    fn into_result(self) -> Result<(), PropertyError> {
        if self {
            Ok(())
        } else {
            Err(PropertyError::assertion("property returned false"))
        }
    }
}

impl<E: Into<PropertyError>> PropertyOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), PropertyError> {
        self.map_err(Into::into)
    }
}

/// A synchronous property over the argument tuple `A`
pub trait Predicate<A> {
    /// Test the property with the given arguments
    fn test(&mut self, args: &A) -> Result<(), PropertyError>;
}

/// An asynchronous property over the argument tuple `A`
pub trait AsyncPredicate<A> {
    /// Future resolving to the outcome of one test
    type Future: Future<Output = Result<(), PropertyError>>;

    /// Test the property with the given arguments
    fn test(&mut self, args: A) -> Self::Future;
}

macro_rules! impl_predicate {
    ($($T:ident $idx:tt),+) => {
        impl<F, R, $($T),+> Predicate<($($T,)+)> for F
        where
            F: FnMut($(&$T),+) -> R,
            R: PropertyOutcome,
        {
            fn test(&mut self, args: &($($T,)+)) -> Result<(), PropertyError> {
                (self)($(&args.$idx),+).into_result()
            }
        }

        impl<F, Fut, $($T),+> AsyncPredicate<($($T,)+)> for F
        where
            F: FnMut($($T),+) -> Fut,
            Fut: Future<Output = Result<(), PropertyError>>,
        {
            type Future = Fut;

            fn test(&mut self, args: ($($T,)+)) -> Fut {
                (self)($(args.$idx),+)
            }
        }
    };
}

impl_predicate!(A 0);
impl_predicate!(A 0, B 1);
impl_predicate!(A 0, B 1, C 2);
impl_predicate!(A 0, B 1, C 2, D 3);
impl_predicate!(A 0, B 1, C 2, D 3, E 4);
impl_predicate!(A 0, B 1, C 2, D 3, E 4, G 5);

/// Run one predicate evaluation, turning a panic into an assertion failure.
pub(crate) fn guard<F>(test: F) -> Result<(), PropertyError>
where
    F: FnOnce() -> Result<(), PropertyError>,
{
    panic::catch_unwind(AssertUnwindSafe(test))
        .unwrap_or_else(|payload| Err(PropertyError::from_panic(payload)))
}

/// Await one asynchronous predicate evaluation, turning a panic into an assertion failure.
///
/// Covers panics raised while building the future as well as while polling it.
pub(crate) async fn guard_async<F, Fut>(test: F) -> Result<(), PropertyError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), PropertyError>>,
{
    match panic::catch_unwind(AssertUnwindSafe(test)) {
        Ok(future) => AssertUnwindSafe(future)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(PropertyError::from_panic(payload))),
        Err(payload) => Err(PropertyError::from_panic(payload)),
    }
}
