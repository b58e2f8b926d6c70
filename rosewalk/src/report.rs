//! Failure reports: the diagnostic assembled once a failing input has been shrunk.

use std::fmt;
use std::time::Duration;

use crate::error::PropertyError;

#[cfg(feature = "persistence")]
use serde::{Deserialize, Serialize};

/// One property argument's original sample next to its shrunk value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct PropertyFailureInput<T> {
    /// The value the failing sample started with
    pub original: T,
    /// The value after shrinking; equal to `original` when shrinking made no progress
    pub shrunk: T,
}

impl<T> PropertyFailureInput<T> {
    /// Pair an original value with its shrunk value
    pub fn new(original: T, shrunk: T) -> Self {
        Self { original, shrunk }
    }
}

impl<T: PartialEq> PropertyFailureInput<T> {
    /// Whether shrinking changed the value
    pub fn is_shrunk(&self) -> bool {
        self.original != self.shrunk
    }
}

impl<T: PartialEq + fmt::Debug> PropertyFailureInput<T> {
    /// Render both sides with `Debug`.
    ///
    /// Equal values render to the same text, so the rendered pair keeps the "not shrunk"
    /// information for the report.
    pub fn shown(&self) -> PropertyFailureInput<String> {
        let original = format!("{:?}", self.original);
        let shrunk = if self.is_shrunk() {
            format!("{:?}", self.shrunk)
        } else {
            original.clone()
        };
        PropertyFailureInput { original, shrunk }
    }
}

/// The resolved data of a property failure, rendered by its `Display` impl.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    /// Number of attempts made up to and including the failing one
    pub attempts: usize,
    /// Inputs in argument order
    pub inputs: Vec<PropertyFailureInput<String>>,
    /// Seed that reproduces the run
    pub seed: u64,
    /// The error the report is built around
    pub cause: PropertyError,
}

impl FailureReport {
    /// Assemble a report from already resolved data
    pub fn new(
        attempts: usize,
        inputs: Vec<PropertyFailureInput<String>>,
        seed: u64,
        cause: PropertyError,
    ) -> Self {
        Self {
            attempts,
            inputs,
            seed,
            cause,
        }
    }

    /// The `Caused by` line for the report's cause
    pub fn caused_by(&self) -> String {
        let message = self.cause.message();
        if self.cause.is_assertion() {
            format!("Caused by: {}", message.trim())
        } else {
            format!("Caused by {}: {}", self.cause.kind(), message.trim())
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Property failed after {} attempts", self.attempts)?;
        if !self.inputs.is_empty() {
            writeln!(f)?;
            for (index, input) in self.inputs.iter().enumerate() {
                if input.shrunk == input.original {
                    writeln!(f, "\tArg {}: {}", index, input.shrunk)?;
                } else {
                    writeln!(
                        f,
                        "\tArg {}: {} (shrunk from {})",
                        index, input.shrunk, input.original
                    )?;
                }
            }
        }
        writeln!(f)?;
        writeln!(f, "{}", self.caused_by())?;
        writeln!(f)?;
        writeln!(f, "Repeat this test by using seed {}", self.seed)
    }
}

/// Build the failure message for a property test.
pub fn build_report(
    attempts: usize,
    inputs: &[PropertyFailureInput<String>],
    seed: u64,
    cause: &PropertyError,
) -> String {
    FailureReport::new(attempts, inputs.to_vec(), seed, cause.clone()).to_string()
}

/// Information about a successful property check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuccess {
    /// Number of iterations completed
    pub iterations: usize,
    /// Seed the run used
    pub seed: u64,
}

impl TestSuccess {
    /// Create a new TestSuccess instance
    pub fn new(iterations: usize, seed: u64) -> Self {
        Self { iterations, seed }
    }
}

/// Information about a falsified property
///
/// This is the single error a failing check surfaces: the typed original and shrunk
/// argument tuples together with the rendered [`FailureReport`].
#[derive(Debug)]
pub struct TestFailure<A> {
    /// The error that caused the failure
    pub cause: PropertyError,
    /// Original arguments of the failing sample
    pub original_input: A,
    /// Arguments after shrinking, as reported
    pub shrunk_input: A,
    /// Number of candidates tested while shrinking, over all arguments
    pub shrink_attempts: usize,
    /// Attempt number on which the property failed
    pub attempts: usize,
    /// Seed that reproduces the run
    pub seed: u64,
    /// Time spent on shrinking
    pub shrink_duration: Duration,
    /// The assembled report
    pub report: FailureReport,
}

impl<A> TestFailure<A> {
    /// The rendered failure message
    pub fn message(&self) -> String {
        self.report.to_string()
    }

    /// Get a concise summary of the test failure
    pub fn summary(&self) -> String {
        format!(
            "Property failed after {} attempts (seed {}): {}",
            self.attempts,
            self.seed,
            self.report.caused_by()
        )
    }
}

impl<A> fmt::Display for TestFailure<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report)
    }
}

impl<A: fmt::Debug> std::error::Error for TestFailure<A> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
