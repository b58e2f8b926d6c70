//! Multi-argument shrinking.
//!
//! A property takes between one and six arguments, each sampled with its own shrink tree.
//! [`Arguments`] shrinks them one after another in argument order. While argument `i` is
//! being shrunk, every other argument is held at its current best value: arguments before
//! `i` at their shrunk value, arguments after `i` at their original value. The result is
//! minimal per argument given the others, not jointly minimal, and depends on argument order.

use std::fmt;
use std::future::Future;
use std::hash::Hash;

use rand::RngCore;

use crate::candidate::Candidate;
use crate::error::PropertyError;
use crate::generator::Generator;
use crate::report::PropertyFailureInput;
use crate::shrink::{ShrinkConfig, shrink, shrink_async};

/// Outcome of shrinking every argument of a failing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentsShrink<A> {
    /// The best argument tuple found
    pub shrunk: A,
    /// Per argument, the error of its shrunk value if its walk found a smaller failure
    pub causes: Vec<Option<PropertyError>>,
    /// Per argument, the number of candidates tested
    pub attempts: Vec<usize>,
    /// Per argument, whether its tree had anything to shrink
    pub shrinkable: Vec<bool>,
}

impl<A> ArgumentsShrink<A> {
    /// The canonical cause: the last argument walk that reported one.
    pub fn cause(&self) -> Option<&PropertyError> {
        self.causes.iter().rev().find_map(Option::as_ref)
    }

    /// Candidates tested over all arguments
    pub fn total_attempts(&self) -> usize {
        self.attempts.iter().sum()
    }

    /// Whether no argument tree had anything to shrink
    pub fn all_unshrinkable(&self) -> bool {
        self.shrinkable.iter().all(|shrinkable| !shrinkable)
    }

    fn with_capacity(shrunk: A, arity: usize) -> Self {
        Self {
            shrunk,
            causes: Vec::with_capacity(arity),
            attempts: Vec::with_capacity(arity),
            shrinkable: Vec::with_capacity(arity),
        }
    }
}

/// A tuple of property arguments.
///
/// Implemented for tuples of one to six elements whose types are
/// `Clone + Eq + Hash + Debug`.
pub trait Arguments: Clone + fmt::Debug + Sized {
    /// One candidate tree per argument
    type Trees;

    /// Number of arguments
    const ARITY: usize;

    /// The root values of the trees
    fn roots(trees: &Self::Trees) -> Self;

    /// Pair original and shrunk values, rendered for a report
    fn failure_inputs(original: &Self, shrunk: &Self) -> Vec<PropertyFailureInput<String>>;

    /// Shrink each argument in order, starting from `original`.
    fn shrink_all<F>(
        trees: &Self::Trees,
        original: &Self,
        config: &ShrinkConfig,
        test: F,
    ) -> ArgumentsShrink<Self>
    where
        F: FnMut(&Self) -> Result<(), PropertyError>;

    /// Shrink each argument in order with an asynchronous test.
    fn shrink_all_async<F, Fut>(
        trees: &Self::Trees,
        original: &Self,
        config: &ShrinkConfig,
        test: F,
    ) -> impl Future<Output = ArgumentsShrink<Self>>
    where
        F: FnMut(Self) -> Fut,
        Fut: Future<Output = Result<(), PropertyError>>;
}

/// Generators for every argument of a property
pub trait Generators<A: Arguments> {
    /// Sample one candidate tree per argument
    fn sample(&self, rng: &mut dyn RngCore) -> A::Trees;
}

macro_rules! impl_arguments {
    ($arity:expr; $($T:ident $G:ident $idx:tt),+) => {
        impl<$($T),+> Arguments for ($($T,)+)
        where
            $($T: Clone + Eq + Hash + fmt::Debug,)+
        {
            type Trees = ($(Candidate<$T>,)+);

            const ARITY: usize = $arity;

            fn roots(trees: &Self::Trees) -> Self {
                ($(trees.$idx.value().clone(),)+)
            }

            fn failure_inputs(original: &Self, shrunk: &Self) -> Vec<PropertyFailureInput<String>> {
                vec![$(
                    PropertyFailureInput::new(&original.$idx, &shrunk.$idx).shown(),
                )+]
            }

            fn shrink_all<F>(
                trees: &Self::Trees,
                original: &Self,
                config: &ShrinkConfig,
                mut test: F,
            ) -> ArgumentsShrink<Self>
            where
                F: FnMut(&Self) -> Result<(), PropertyError>,
            {
                let mut outcome = ArgumentsShrink::with_capacity(original.clone(), Self::ARITY);
                $(
                    let result = shrink(&trees.$idx, config, |candidate: &$T| {
                        let mut args = outcome.shrunk.clone();
                        args.$idx = candidate.clone();
                        test(&args)
                    });
                    outcome.shrunk.$idx = result.minimal;
                    outcome.causes.push(result.cause);
                    outcome.attempts.push(result.attempts);
                    outcome.shrinkable.push(result.shrinkable);
                )+
                outcome
            }

            async fn shrink_all_async<F, Fut>(
                trees: &Self::Trees,
                original: &Self,
                config: &ShrinkConfig,
                mut test: F,
            ) -> ArgumentsShrink<Self>
            where
                F: FnMut(Self) -> Fut,
                Fut: Future<Output = Result<(), PropertyError>>,
            {
                let mut outcome = ArgumentsShrink::with_capacity(original.clone(), Self::ARITY);
                $(
                    let result = shrink_async(&trees.$idx, config, |candidate: $T| {
                        let mut args = outcome.shrunk.clone();
                        args.$idx = candidate;
                        test(args)
                    })
                    .await;
                    outcome.shrunk.$idx = result.minimal;
                    outcome.causes.push(result.cause);
                    outcome.attempts.push(result.attempts);
                    outcome.shrinkable.push(result.shrinkable);
                )+
                outcome
            }
        }

        impl<$($T,)+ $($G),+> Generators<($($T,)+)> for ($($G,)+)
        where
            $($T: Clone + Eq + Hash + fmt::Debug,)+
            $($G: Generator<$T>,)+
        {
            fn sample(&self, rng: &mut dyn RngCore) -> ($(Candidate<$T>,)+) {
                ($(self.$idx.generate(rng),)+)
            }
        }
    };
}

impl_arguments!(1; A GA 0);
impl_arguments!(2; A GA 0, B GB 1);
impl_arguments!(3; A GA 0, B GB 1, C GC 2);
impl_arguments!(4; A GA 0, B GB 1, C GC 2, D GD 3);
impl_arguments!(5; A GA 0, B GB 1, C GC 2, D GD 3, E GE 4);
impl_arguments!(6; A GA 0, B GB 1, C GC 2, D GD 3, E GE 4, F6 GF 5);
