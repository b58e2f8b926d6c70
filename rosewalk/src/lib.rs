#![allow(clippy::result_large_err)]
#![allow(clippy::too_many_arguments)]

//! # Rosewalk - Shrinking for Property-Based Testing
//!
//! Rosewalk finds small counter-examples. Every sampled argument comes with a lazy tree of
//! simpler candidates ([`Candidate`]); when a property fails, the tree is walked depth first,
//! keeping the smallest value that still fails, and the failure is reported together with
//! the seed that reproduces it.
//!
//! ## Quick Start
//!
//! ```rust
//! use rand::Rng;
//! use rosewalk::generator::unfold;
//! use rosewalk::shrink::strategies::towards_zero;
//! use rosewalk::{PropertyResult, PropertyTestBuilder};
//!
//! let result: PropertyResult<(u32, u32)> = PropertyTestBuilder::new()
//!     .seed(7)
//!     .run(
//!         (
//!             unfold(|rng| rng.gen_range(0u32..1000), |n| towards_zero(*n)),
//!             unfold(|rng| rng.gen_range(0u32..1000), |n| towards_zero(*n)),
//!         ),
//!         |a: &u32, b: &u32| a + b < 1500,
//!     );
//!
//! let failure = result.unwrap_err().unwrap_failed();
//! let (a, b) = failure.shrunk_input;
//! assert!(a + b >= 1500);
//! println!("{}", failure);
//! ```

// Public modules
pub mod arguments;
pub mod candidate;
pub mod config;
pub mod error;
pub mod execution;
pub mod generator;
#[cfg(feature = "persistence")]
pub mod persistence;
pub mod property;
pub mod report;
pub mod rng;
pub mod shrink;

// Re-export the main public API
pub use arguments::{Arguments, ArgumentsShrink, Generators};
pub use candidate::Candidate;
pub use config::{
    ConfigError, ConfigManager, ExceptionReport, GlobalConfig, TestConfig, create_test_config,
    get_global_config, set_global_config,
};
pub use error::{CheckError, PropertyError, PropertyResult};
pub use execution::{
    AsyncPropertyTest, PropertyTest, PropertyTestBuilder, check_all, check_all_async,
    check_all_async_with_config, check_all_with_config,
};
pub use generator::{ConstantGenerator, Generator};
#[cfg(feature = "persistence")]
pub use persistence::{FailedSeed, PersistenceConfig, SeedStore};
pub use property::{AsyncPredicate, Predicate, PropertyOutcome};
pub use report::{FailureReport, PropertyFailureInput, TestFailure, TestSuccess, build_report};
pub use rng::{create_seeded_rng, resolve_seed};
pub use shrink::{ShrinkConfig, ShrinkResult, ShrinkStep, ShrinkingMode, shrink, shrink_async};
