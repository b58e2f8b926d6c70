//! Shrinking functionality for minimizing failing test cases.
//!
//! A shrink walk takes the lazy [`Candidate`] tree of a failing value and searches it depth
//! first for a simpler value that still fails. At every node the children are tried in order;
//! passing children are skipped without exploring below them, and the first failing child
//! becomes the new node. The walk ends when a node has no failing child left or the
//! [`ShrinkingMode`] budget runs out, and the last failing value is the result.
//!
//! Each walk owns a visited set, so a value reachable along several paths is tested at most
//! once, and a [`Counter`] of tested candidates that drives the budget.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use log::{debug, info, trace};

use crate::candidate::Candidate;
use crate::error::PropertyError;
use crate::property::{guard, guard_async};

/// How far a failing value is shrunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShrinkingMode {
    /// Report the failing value as-is.
    Off,
    /// Keep going until the tree is exhausted.
    Unbounded,
    /// Test at most this many candidates over the whole walk.
    Bounded(usize),
}

impl Default for ShrinkingMode {
    fn default() -> Self {
        ShrinkingMode::Bounded(1000)
    }
}

impl ShrinkingMode {
    /// Whether another candidate may be tested after `attempts` candidates.
    pub fn permits(&self, attempts: usize) -> bool {
        match self {
            ShrinkingMode::Off => false,
            ShrinkingMode::Unbounded => true,
            ShrinkingMode::Bounded(limit) => attempts < *limit,
        }
    }

    /// Whether this mode tests any candidate at all
    pub fn is_enabled(&self) -> bool {
        self.permits(0)
    }
}

/// Configuration for one shrink walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShrinkConfig {
    /// Budget of the walk
    pub mode: ShrinkingMode,
    /// Log every tested candidate at `info` instead of `trace`
    pub verbose: bool,
}

impl ShrinkConfig {
    /// Create a shrink configuration with the given mode
    pub fn new(mode: ShrinkingMode) -> Self {
        Self {
            mode,
            verbose: false,
        }
    }

    /// Enable verbose step logging
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

/// Number of distinct candidates tested during one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    count: usize,
}

impl Counter {
    /// A counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count
    pub fn count(&self) -> usize {
        self.count
    }

    /// Count one more tested candidate, returning the new count
    pub fn increment(&mut self) -> usize {
        self.count += 1;
        self.count
    }
}

/// Outcome of walking a subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum ShrinkStep<T> {
    /// No simpler failing value was found below the node.
    CompletedShrinking,
    /// A strictly simpler value failed with `cause`.
    FoundSmallerFailure { value: T, cause: PropertyError },
}

/// Result of a shrink walk
#[derive(Debug, Clone, PartialEq)]
pub struct ShrinkResult<T> {
    /// Root value the walk started from
    pub original: T,
    /// Smallest failing value found; the root when nothing smaller failed
    pub minimal: T,
    /// Error raised by `minimal`, if the walk found a smaller failure
    pub cause: Option<PropertyError>,
    /// Number of candidates tested
    pub attempts: usize,
    /// Whether the root had any children to try
    pub shrinkable: bool,
    /// Whether the walk ran to the end rather than stopping on its budget
    pub completed: bool,
    /// Time spent shrinking
    pub duration: Duration,
}

impl<T: Clone> ShrinkResult<T> {
    /// Result for a tree with nothing to shrink
    pub fn unshrinkable(original: T) -> Self {
        Self {
            minimal: original.clone(),
            original,
            cause: None,
            attempts: 0,
            shrinkable: false,
            completed: true,
            duration: Duration::from_secs(0),
        }
    }
}

impl<T> ShrinkResult<T> {
    /// Whether a smaller failing value was found
    pub fn is_shrunk(&self) -> bool {
        self.cause.is_some()
    }

    /// The walk outcome as a step result
    pub fn step(&self) -> ShrinkStep<T>
    where
        T: Clone,
    {
        match &self.cause {
            Some(cause) => ShrinkStep::FoundSmallerFailure {
                value: self.minimal.clone(),
                cause: cause.clone(),
            },
            None => ShrinkStep::CompletedShrinking,
        }
    }
}

/// State owned by a single walk.
struct Walk<'a, T> {
    config: &'a ShrinkConfig,
    visited: HashSet<T>,
    counter: Counter,
    stopped: bool,
    started: Instant,
}

impl<'a, T> Walk<'a, T>
where
    T: Clone + Eq + Hash + fmt::Debug,
{
    fn start(config: &'a ShrinkConfig, root: &T) -> Self {
        let walk = Self {
            config,
            visited: HashSet::new(),
            counter: Counter::new(),
            stopped: false,
            started: Instant::now(),
        };
        walk.step_log(format_args!("Attempting to shrink failed arg {:?}", root));
        walk
    }

    fn step_log(&self, message: fmt::Arguments<'_>) {
        if self.config.verbose {
            info!("{}", message);
        } else {
            trace!("{}", message);
        }
    }

    /// Check the budget before the next candidate.
    fn permits(&mut self) -> bool {
        if self.config.mode.permits(self.counter.count()) {
            true
        } else {
            self.stopped = true;
            false
        }
    }

    /// Mark a value as visited, returning false if it was seen before.
    fn admit(&mut self, value: &T) -> bool {
        if self.visited.contains(value) {
            false
        } else {
            self.visited.insert(value.clone());
            true
        }
    }

    fn record(&mut self, value: &T, passed: bool) {
        let attempt = self.counter.increment();
        let outcome = if passed { "pass" } else { "fail" };
        self.step_log(format_args!("Shrink #{}: {:?} {}", attempt, value, outcome));
    }

    fn finish(self, root: &T, step: ShrinkStep<T>) -> ShrinkResult<T> {
        let (minimal, cause) = match step {
            ShrinkStep::CompletedShrinking => (root.clone(), None),
            ShrinkStep::FoundSmallerFailure { value, cause } => (value, Some(cause)),
        };
        let attempts = self.counter.count();

        let summary = match attempts {
            0 => format!("Shrink result => {:?}", minimal),
            n => format!("Shrink result (after {} shrinks) => {:?}", n, minimal),
        };
        if self.config.verbose {
            info!("{}", summary);
        } else {
            debug!("{}", summary);
        }

        ShrinkResult {
            original: root.clone(),
            minimal,
            cause,
            attempts,
            shrinkable: true,
            completed: !self.stopped,
            duration: self.started.elapsed(),
        }
    }
}

/// Shrink a failing value by walking its candidate tree.
///
/// `test` returns `Ok(())` for passing values; any error, or a panic, marks the value as
/// failing. The root itself is assumed to fail and is never re-tested.
///
/// ```rust
/// use rosewalk::shrink::{shrink, strategies, ShrinkConfig, ShrinkingMode};
/// use rosewalk::{Candidate, PropertyError};
///
/// let tree = Candidate::unfold(100u32, |n| strategies::halve(*n));
/// let result = shrink(&tree, &ShrinkConfig::new(ShrinkingMode::Unbounded), |n| {
///     if *n > 5 { Err(PropertyError::assertion("too big")) } else { Ok(()) }
/// });
/// assert_eq!(result.minimal, 6);
/// ```
pub fn shrink<T, F>(tree: &Candidate<T>, config: &ShrinkConfig, mut test: F) -> ShrinkResult<T>
where
    T: Clone + Eq + Hash + fmt::Debug,
    F: FnMut(&T) -> Result<(), PropertyError>,
{
    if tree.is_empty() {
        debug!("Nothing to shrink for {:?}", tree.value());
        return ShrinkResult::unshrinkable(tree.value().clone());
    }

    let mut walk = Walk::start(config, tree.value());
    let mut node = tree;
    let mut step = ShrinkStep::CompletedShrinking;

    'descend: loop {
        for child in node.children() {
            if !walk.permits() {
                break 'descend;
            }
            if !walk.admit(child.value()) {
                continue;
            }
            match guard(|| test(child.value())) {
                Ok(()) => walk.record(child.value(), true),
                Err(cause) => {
                    walk.record(child.value(), false);
                    step = ShrinkStep::FoundSmallerFailure {
                        value: child.value().clone(),
                        cause,
                    };
                    node = child;
                    continue 'descend;
                }
            }
        }
        break;
    }

    walk.finish(tree.value(), step)
}

/// Shrink a failing value with an asynchronous predicate.
///
/// Candidates are awaited one at a time, in the same order as [`shrink`], so the sequence of
/// predicate calls is identical for identical trees. A panic inside the predicate fails the
/// candidate, as it does for [`shrink`].
pub async fn shrink_async<T, F, Fut>(
    tree: &Candidate<T>,
    config: &ShrinkConfig,
    mut test: F,
) -> ShrinkResult<T>
where
    T: Clone + Eq + Hash + fmt::Debug,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), PropertyError>>,
{
    if tree.is_empty() {
        debug!("Nothing to shrink for {:?}", tree.value());
        return ShrinkResult::unshrinkable(tree.value().clone());
    }

    let mut walk = Walk::start(config, tree.value());
    let mut node = tree;
    let mut step = ShrinkStep::CompletedShrinking;

    'descend: loop {
        for child in node.children() {
            if !walk.permits() {
                break 'descend;
            }
            if !walk.admit(child.value()) {
                continue;
            }
            match guard_async(|| test(child.value().clone())).await {
                Ok(()) => walk.record(child.value(), true),
                Err(cause) => {
                    walk.record(child.value(), false);
                    step = ShrinkStep::FoundSmallerFailure {
                        value: child.value().clone(),
                        cause,
                    };
                    node = child;
                    continue 'descend;
                }
            }
        }
        break;
    }

    walk.finish(tree.value(), step)
}

/// Reduction functions for building candidate trees with [`Candidate::unfold`].
pub mod strategies {
    use num_traits::PrimInt;

    /// Values between `destination` and `value`, closest to `destination` first.
    ///
    /// Starts with `destination` itself, then halves the remaining distance:
    /// `towards(0, 100)` is `[0, 50, 75, 88, 94, 97, 99]`.
    pub fn towards<T: PrimInt>(destination: T, value: T) -> Vec<T> {
        if destination == value {
            return Vec::new();
        }

        let two = T::one() + T::one();
        let mut shrinks = vec![destination];
        if value > destination {
            let mut step = value / two - destination / two;
            while step > T::zero() {
                let candidate = value - step;
                if candidate != destination {
                    shrinks.push(candidate);
                }
                step = step / two;
            }
        } else {
            let mut step = destination / two - value / two;
            while step > T::zero() {
                let candidate = value + step;
                if candidate != destination {
                    shrinks.push(candidate);
                }
                step = step / two;
            }
        }
        shrinks
    }

    /// [`towards`] zero.
    pub fn towards_zero<T: PrimInt>(value: T) -> Vec<T> {
        towards(T::zero(), value)
    }

    /// A single halving step, yielding a chain `100, 50, 25, ..., 1, 0`.
    pub fn halve<T: PrimInt>(value: T) -> Vec<T> {
        if value == T::zero() {
            Vec::new()
        } else {
            vec![value / (T::one() + T::one())]
        }
    }
}
