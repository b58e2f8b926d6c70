//! The generator contract: how property arguments are sampled.
//!
//! A generator draws a value from an RNG and returns it as the root of a [`Candidate`] tree,
//! so the shrinker later finds simpler values below it. How values are drawn is up to the
//! generator; this module only provides the contract and a few small adapters.

use std::sync::Arc;

use rand::RngCore;

use crate::candidate::Candidate;

/// Core generator trait for sampling test data with its shrink tree
pub trait Generator<T> {
    /// Sample a value using the provided RNG
    fn generate(&self, rng: &mut dyn RngCore) -> Candidate<T>;
}

impl<T, F> Generator<T> for F
where
    F: Fn(&mut dyn RngCore) -> Candidate<T>,
{
    fn generate(&self, rng: &mut dyn RngCore) -> Candidate<T> {
        self(rng)
    }
}

/// A generator that always produces the same, unshrinkable value
#[derive(Debug, Clone)]
pub struct ConstantGenerator<T> {
    value: T,
}

impl<T: Clone> ConstantGenerator<T> {
    /// Create a new constant generator
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone> Generator<T> for ConstantGenerator<T> {
    fn generate(&self, _rng: &mut dyn RngCore) -> Candidate<T> {
        Candidate::leaf(self.value.clone())
    }
}

/// Generator built from a sampling function and a reduction function.
///
/// Created by [`unfold`].
pub struct Unfold<S, F> {
    sample: S,
    shrinker: Arc<F>,
}

/// Sample with `sample` and shrink with `shrinker`, as in [`Candidate::unfold`].
///
/// ```rust
/// use rand::Rng;
/// use rosewalk::generator::{unfold, Generator};
/// use rosewalk::shrink::strategies::towards_zero;
///
/// let ints = unfold(|rng| rng.gen_range(-100i32..100), |n| towards_zero(*n));
/// let mut rng = rosewalk::rng::create_seeded_rng(1);
/// let tree = ints.generate(&mut rng);
/// assert!(tree.children().iter().all(|c| c.value().abs() <= tree.value().abs()));
/// ```
pub fn unfold<T, S, F>(sample: S, shrinker: F) -> Unfold<S, F>
where
    S: Fn(&mut dyn RngCore) -> T,
    F: Fn(&T) -> Vec<T> + Send + Sync + 'static,
{
    Unfold {
        sample,
        shrinker: Arc::new(shrinker),
    }
}

impl<T, S, F> Generator<T> for Unfold<S, F>
where
    T: Send + 'static,
    S: Fn(&mut dyn RngCore) -> T,
    F: Fn(&T) -> Vec<T> + Send + Sync + 'static,
{
    fn generate(&self, rng: &mut dyn RngCore) -> Candidate<T> {
        let shrinker = Arc::clone(&self.shrinker);
        Candidate::unfold((self.sample)(rng), move |value| shrinker(value))
    }
}
