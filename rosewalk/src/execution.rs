//! Property test execution engine for running synchronous and asynchronous property tests.
//!
//! A check samples one candidate tree per argument, evaluates the property on the roots and
//! stops at the first failing attempt. The failing sample is then shrunk argument by argument
//! and the result is returned as a single [`TestFailure`].

use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::RngCore;

use crate::arguments::{Arguments, ArgumentsShrink, Generators};
use crate::config::{ExceptionReport, TestConfig, create_test_config};
use crate::error::{CheckError, PropertyError, PropertyResult};
use crate::property::{AsyncPredicate, Predicate, guard, guard_async};
use crate::report::{FailureReport, TestFailure, TestSuccess};
use crate::rng::{create_seeded_rng, resolve_seed};
use crate::shrink::ShrinkingMode;

#[cfg(feature = "persistence")]
use crate::persistence::{self, FailedSeed, PersistenceConfig};

/// Settings shared by the synchronous and asynchronous drivers
#[derive(Debug, Clone)]
struct Settings {
    config: TestConfig,
    #[cfg(feature = "persistence")]
    persistence_config: Option<PersistenceConfig>,
}

impl Settings {
    fn new(config: TestConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "persistence")]
            persistence_config: None,
        }
    }

    /// The seed of this run: explicit, replayed, or fresh.
    fn seed(&self) -> u64 {
        #[cfg(feature = "persistence")]
        {
            if self.config.seed.is_none()
                && let Some(seed) = self
                    .persistence_config
                    .as_ref()
                    .and_then(persistence::replay_seed)
            {
                return seed;
            }
        }
        resolve_seed(self.config.seed)
    }

    fn start<A: Arguments>(&self) -> Result<u64, PropertyError> {
        self.config.validate()?;
        let seed = self.seed();
        debug!(
            "Checking property over {} argument(s): {} iterations, seed {}, shrinking {:?}",
            A::ARITY,
            self.config.iterations,
            seed,
            self.config.shrinking_mode
        );
        Ok(seed)
    }

    fn failed<A>(&self, failure: &TestFailure<A>) {
        info!("{}", failure.report);

        #[cfg(feature = "persistence")]
        {
            if let Some(persistence_cfg) = &self.persistence_config {
                let record = FailedSeed::new(
                    persistence_cfg.test_name.clone(),
                    failure.seed,
                    failure.attempts,
                    failure.report.inputs.clone(),
                    failure.report.caused_by(),
                );
                persistence::record_failure(persistence_cfg, &record);
            }
        }
    }

    fn passed(&self, seed: u64) -> TestSuccess {
        debug!(
            "Property held for {} iterations with seed {}",
            self.config.iterations, seed
        );

        #[cfg(feature = "persistence")]
        {
            if let Some(persistence_cfg) = &self.persistence_config {
                persistence::clear_failure(persistence_cfg);
            }
        }

        TestSuccess::new(self.config.iterations, seed)
    }
}

/// Sample one tree per argument, turning a generator panic into an error.
fn sample<A, G>(
    generators: &G,
    rng: &mut dyn RngCore,
    attempt: usize,
) -> Result<A::Trees, PropertyError>
where
    A: Arguments,
    G: Generators<A>,
{
    panic::catch_unwind(AssertUnwindSafe(|| {
        <G as Generators<A>>::sample(generators, rng)
    }))
    .map_err(|payload| {
        PropertyError::generation_failed_with_context(
            format!(
                "Generator panicked: {}",
                PropertyError::from_panic(payload).message()
            ),
            Some(format!("attempt {}", attempt)),
        )
    })
}

/// Attach the attempt number to a property failure that does not carry one yet.
fn with_iteration(error: PropertyError, attempt: usize) -> PropertyError {
    match error {
        PropertyError::PropertyFailed {
            message,
            context,
            iteration: None,
        } => PropertyError::PropertyFailed {
            message,
            context,
            iteration: Some(attempt),
        },
        other => other,
    }
}

/// Choose the reported cause and inputs and assemble the failure.
fn conclude<A: Arguments>(
    config: &TestConfig,
    attempt: usize,
    seed: u64,
    original: A,
    outcome: ArgumentsShrink<A>,
    first_error: PropertyError,
    shrink_duration: Duration,
) -> Result<TestFailure<A>, PropertyError> {
    let (cause, inputs) = match config.reported_exception {
        ExceptionReport::First => (first_error, A::failure_inputs(&original, &original)),
        ExceptionReport::Shrunk => {
            if config.shrinking_mode.is_enabled() && outcome.all_unshrinkable() {
                return Err(PropertyError::MissingShrunkCause {
                    arguments: A::ARITY,
                });
            }
            let cause = outcome.cause().cloned().unwrap_or(first_error);
            (cause, A::failure_inputs(&original, &outcome.shrunk))
        }
    };

    let report = FailureReport::new(attempt, inputs, seed, cause.clone());
    Ok(TestFailure {
        cause,
        original_input: original,
        shrink_attempts: outcome.total_attempts(),
        shrunk_input: outcome.shrunk,
        attempts: attempt,
        seed,
        shrink_duration,
        report,
    })
}

/// Core property test execution struct
pub struct PropertyTest<A, G, P> {
    generators: G,
    property: P,
    settings: Settings,
    _phantom: PhantomData<A>,
}

impl<A, G, P> PropertyTest<A, G, P>
where
    A: Arguments,
    G: Generators<A>,
    P: Predicate<A>,
{
    /// Create a new property test with the given generators, property, and configuration
    pub fn new(generators: G, property: P, config: TestConfig) -> Self {
        Self {
            generators,
            property,
            settings: Settings::new(config),
            _phantom: PhantomData,
        }
    }

    /// Replay and record failing seeds with the given configuration
    #[cfg(feature = "persistence")]
    pub fn with_persistence(mut self, config: PersistenceConfig) -> Self {
        self.settings.persistence_config = Some(config);
        self
    }

    /// Execute the property test
    pub fn run(mut self) -> PropertyResult<A> {
        let seed = self.settings.start::<A>()?;
        let config = &self.settings.config;
        let shrink_config = config.shrink_config();
        let mut rng = create_seeded_rng(seed);

        for attempt in 1..=config.iterations {
            let trees = sample::<A, G>(&self.generators, &mut rng, attempt)?;
            let original = A::roots(&trees);

            let property = &mut self.property;
            let Err(error) = guard(|| property.test(&original)) else {
                continue;
            };
            let error = with_iteration(error, attempt);
            debug!("Attempt {} failed for {:?}: {}", attempt, original, error);

            let shrink_start = Instant::now();
            let outcome = A::shrink_all(&trees, &original, &shrink_config, |args| {
                property.test(args)
            });
            let failure = conclude(
                config,
                attempt,
                seed,
                original,
                outcome,
                error,
                shrink_start.elapsed(),
            )?;

            self.settings.failed(&failure);
            return Err(CheckError::Failed(failure));
        }

        Ok(self.settings.passed(seed))
    }
}

/// Async property test execution struct
pub struct AsyncPropertyTest<A, G, P> {
    generators: G,
    property: P,
    settings: Settings,
    _phantom: PhantomData<A>,
}

impl<A, G, P> AsyncPropertyTest<A, G, P>
where
    A: Arguments,
    G: Generators<A>,
    P: AsyncPredicate<A>,
{
    /// Create a new async property test with the given generators, property, and configuration
    pub fn new(generators: G, property: P, config: TestConfig) -> Self {
        Self {
            generators,
            property,
            settings: Settings::new(config),
            _phantom: PhantomData,
        }
    }

    /// Replay and record failing seeds with the given configuration
    #[cfg(feature = "persistence")]
    pub fn with_persistence(mut self, config: PersistenceConfig) -> Self {
        self.settings.persistence_config = Some(config);
        self
    }

    /// Execute the async property test
    ///
    /// The property is awaited once per attempt and once per shrink candidate, never
    /// concurrently. A panic inside the property fails the attempt like an assertion.
    pub async fn run(mut self) -> PropertyResult<A> {
        let seed = self.settings.start::<A>()?;
        let config = &self.settings.config;
        let shrink_config = config.shrink_config();
        let mut rng = create_seeded_rng(seed);

        for attempt in 1..=config.iterations {
            let trees = sample::<A, G>(&self.generators, &mut rng, attempt)?;
            let original = A::roots(&trees);

            let property = &mut self.property;
            let Err(error) = guard_async(|| property.test(original.clone())).await else {
                continue;
            };
            let error = with_iteration(error, attempt);
            debug!("Attempt {} failed for {:?}: {}", attempt, original, error);

            let shrink_start = Instant::now();
            let outcome = A::shrink_all_async(&trees, &original, &shrink_config, |args| {
                property.test(args)
            })
            .await;
            let failure = conclude(
                config,
                attempt,
                seed,
                original,
                outcome,
                error,
                shrink_start.elapsed(),
            )?;

            self.settings.failed(&failure);
            return Err(CheckError::Failed(failure));
        }

        Ok(self.settings.passed(seed))
    }
}

/// Check a property with the thread's global defaults
pub fn check_all<A, G, P>(generators: G, property: P) -> PropertyResult<A>
where
    A: Arguments,
    G: Generators<A>,
    P: Predicate<A>,
{
    check_all_with_config(generators, property, create_test_config())
}

/// Check a property with a custom configuration
pub fn check_all_with_config<A, G, P>(
    generators: G,
    property: P,
    config: TestConfig,
) -> PropertyResult<A>
where
    A: Arguments,
    G: Generators<A>,
    P: Predicate<A>,
{
    PropertyTest::new(generators, property, config).run()
}

/// Check an async property with the thread's global defaults
pub async fn check_all_async<A, G, P>(generators: G, property: P) -> PropertyResult<A>
where
    A: Arguments,
    G: Generators<A>,
    P: AsyncPredicate<A>,
{
    check_all_async_with_config(generators, property, create_test_config()).await
}

/// Check an async property with a custom configuration
pub async fn check_all_async_with_config<A, G, P>(
    generators: G,
    property: P,
    config: TestConfig,
) -> PropertyResult<A>
where
    A: Arguments,
    G: Generators<A>,
    P: AsyncPredicate<A>,
{
    AsyncPropertyTest::new(generators, property, config)
        .run()
        .await
}

/// Builder pattern for configuring property checks
#[derive(Debug, Clone)]
pub struct PropertyTestBuilder {
    config: TestConfig,
    #[cfg(feature = "persistence")]
    persistence_config: Option<PersistenceConfig>,
}

impl PropertyTestBuilder {
    /// Create a builder starting from the thread's global defaults
    pub fn new() -> Self {
        Self {
            config: create_test_config(),
            #[cfg(feature = "persistence")]
            persistence_config: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: TestConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of test iterations
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    /// Set the random seed for reproducible tests
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set how far failing samples are shrunk
    pub fn shrinking(mut self, mode: ShrinkingMode) -> Self {
        self.config.shrinking_mode = mode;
        self
    }

    /// Choose which error is reported as the cause
    pub fn reported_exception(mut self, report: ExceptionReport) -> Self {
        self.config.reported_exception = report;
        self
    }

    /// Log every shrink step at `info`
    pub fn verbose_shrinking(mut self) -> Self {
        self.config.verbose_shrinking = true;
        self
    }

    /// Set a failed-seed persistence configuration
    #[cfg(feature = "persistence")]
    pub fn persistence_config(mut self, config: PersistenceConfig) -> Self {
        self.persistence_config = Some(config);
        self
    }

    /// Run a property with the configured parameters
    pub fn run<A, G, P>(self, generators: G, property: P) -> PropertyResult<A>
    where
        A: Arguments,
        G: Generators<A>,
        P: Predicate<A>,
    {
        let test = PropertyTest::new(generators, property, self.config);
        #[cfg(feature = "persistence")]
        let test = match self.persistence_config {
            Some(config) => test.with_persistence(config),
            None => test,
        };
        test.run()
    }

    /// Run an async property with the configured parameters
    pub async fn run_async<A, G, P>(self, generators: G, property: P) -> PropertyResult<A>
    where
        A: Arguments,
        G: Generators<A>,
        P: AsyncPredicate<A>,
    {
        let test = AsyncPropertyTest::new(generators, property, self.config);
        #[cfg(feature = "persistence")]
        let test = match self.persistence_config {
            Some(config) => test.with_persistence(config),
            None => test,
        };
        test.run().await
    }
}

impl Default for PropertyTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
