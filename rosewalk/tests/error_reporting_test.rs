//! Tests for failure reports and error propagation

use rand::RngCore;
use rosewalk::generator::unfold;
use rosewalk::shrink::strategies::{halve, towards_zero};
use rosewalk::{
    Candidate, CheckError, ExceptionReport, Generator, Predicate, PropertyError, PropertyResult,
    PropertyTestBuilder, ShrinkingMode, TestConfig, check_all_with_config,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Generator that always samples the same shrinkable value
struct FixedInt {
    value: i32,
}

impl Generator<i32> for FixedInt {
    fn generate(&self, _rng: &mut dyn RngCore) -> Candidate<i32> {
        Candidate::unfold(self.value, |n| towards_zero(*n))
    }
}

// Property that fails above a limit, with context
struct FailsAbove {
    limit: i32,
}

impl Predicate<(i32,)> for FailsAbove {
    fn test(&mut self, args: &(i32,)) -> Result<(), PropertyError> {
        if args.0 > self.limit {
            Err(PropertyError::property_failed_with_context(
                format!("{} exceeds limit", args.0),
                Some("limit check"),
                None,
            ))
        } else {
            Ok(())
        }
    }
}

fn seeded(seed: u64) -> TestConfig {
    TestConfig {
        seed: Some(seed),
        ..TestConfig::default()
    }
}

#[test]
fn test_report_for_struct_predicate() {
    init_logging();

    let result: PropertyResult<(i32,)> = check_all_with_config(
        (FixedInt { value: 1000 },),
        FailsAbove { limit: 100 },
        seeded(5),
    );
    let failure = result.unwrap_err().unwrap_failed();

    assert_eq!(failure.shrunk_input, (101,));
    assert_eq!(
        failure.message(),
        "Property failed after 1 attempts\n\
         \n\
         \tArg 0: 101 (shrunk from 1000)\n\
         \n\
         Caused by PropertyFailed: 101 exceeds limit (context: limit check)\n\
         \n\
         Repeat this test by using seed 5\n"
    );
    assert_eq!(
        failure.summary(),
        "Property failed after 1 attempts (seed 5): \
         Caused by PropertyFailed: 101 exceeds limit (context: limit check)"
    );
}

#[test]
fn test_first_error_carries_attempt_number() {
    init_logging();

    let config = TestConfig {
        reported_exception: ExceptionReport::First,
        ..seeded(5)
    };
    let result: PropertyResult<(i32,)> =
        check_all_with_config((FixedInt { value: 1000 },), FailsAbove { limit: 100 }, config);
    let failure = result.unwrap_err().unwrap_failed();

    assert_eq!(
        failure.report.caused_by(),
        "Caused by PropertyFailed: 1000 exceeds limit (context: limit check) (iteration: 1)"
    );
    assert!(failure.message().contains("\tArg 0: 1000\n"));
    assert_eq!(failure.shrunk_input, (101,));
}

#[test]
fn test_custom_error_kind_is_named() {
    init_logging();

    let result: PropertyResult<(String,)> = check_all_with_config(
        (unfold(|_| "12a".to_string(), |s: &String| {
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s[1..].to_string()]
            }
        }),),
        |text: &String| {
            text.parse::<u32>()
                .map(|_| ())
                .map_err(|e| PropertyError::from_error(&e))
        },
        seeded(0),
    );
    let failure = result.unwrap_err().unwrap_failed();

    // "2a" and "a" still fail; "" fails with a different message.
    assert_eq!(failure.shrunk_input, ("".to_string(),));
    assert!(
        failure
            .message()
            .contains("Caused by ParseIntError: cannot parse integer from empty string\n")
    );
    assert!(failure.message().contains("\tArg 0: \"\" (shrunk from \"12a\")\n"));
}

#[test]
fn test_panicking_property_is_reported_as_assertion() {
    init_logging();

    let result: PropertyResult<(u32,)> = check_all_with_config(
        (unfold(|_| 40u32, |n| halve(*n)),),
        |n: &u32| assert!(*n < 10, "{} is too large", n),
        seeded(0),
    );
    let failure = result.unwrap_err().unwrap_failed();

    assert_eq!(failure.shrunk_input, (10,));
    assert!(failure.message().contains("Caused by: 10 is too large\n"));
}

#[test]
fn test_check_error_display_and_source() {
    init_logging();

    let result: PropertyResult<(i32,)> = PropertyTestBuilder::new()
        .seed(11)
        .shrinking(ShrinkingMode::Off)
        .run((FixedInt { value: 7 },), |n: &i32| *n < 5);
    let error = result.unwrap_err();

    let rendered = error.to_string();
    assert!(rendered.starts_with("Property failed after 1 attempts\n"));
    assert!(rendered.contains("\tArg 0: 7\n"));

    let source = std::error::Error::source(&error).map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("property returned false"));

    match error {
        CheckError::Failed(failure) => assert_eq!(failure.shrink_attempts, 0),
        CheckError::Error(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
fn test_verbose_shrinking_does_not_change_result() {
    init_logging();

    let run = |verbose: bool| {
        let config = TestConfig {
            verbose_shrinking: verbose,
            ..seeded(3)
        };
        let result: PropertyResult<(i32,)> =
            check_all_with_config((FixedInt { value: 500 },), FailsAbove { limit: 20 }, config);
        result.unwrap_err().unwrap_failed()
    };

    let quiet = run(false);
    let verbose = run(true);
    assert_eq!(quiet.shrunk_input, verbose.shrunk_input);
    assert_eq!(quiet.shrink_attempts, verbose.shrink_attempts);
    assert_eq!(quiet.message(), verbose.message());
}
