//! Multi-argument shrinking through the coordinator and the driver

use rosewalk::generator::unfold;
use rosewalk::shrink::strategies::{halve, towards_zero};
use rosewalk::{
    Arguments, Candidate, ConstantGenerator, PropertyError, PropertyFailureInput, PropertyResult,
    ShrinkConfig, ShrinkingMode, TestConfig, check_all_with_config,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_second_argument_without_smaller_failure_keeps_its_value() {
    init_logging();

    let trees = (
        Candidate::unfold(50u32, |n| halve(*n)),
        Candidate::leaf("x".to_string()),
    );
    let original = <(u32, String)>::roots(&trees);

    let outcome = <(u32, String)>::shrink_all(
        &trees,
        &original,
        &ShrinkConfig::new(ShrinkingMode::Unbounded),
        |(a, b)| {
            if *a >= 10 && b.as_str() == "x" {
                Err(PropertyError::assertion(format!("{} is at least 10", a)))
            } else {
                Ok(())
            }
        },
    );

    assert_eq!(outcome.shrunk, (12, "x".to_string()));
    assert_eq!(outcome.cause(), Some(&PropertyError::assertion("12 is at least 10")));
    assert_eq!(
        <(u32, String)>::failure_inputs(&original, &outcome.shrunk),
        vec![
            PropertyFailureInput::new("50".to_string(), "12".to_string()),
            PropertyFailureInput::new("\"x\"".to_string(), "\"x\"".to_string()),
        ]
    );
}

#[test]
fn test_earlier_arguments_absorb_the_reduction() {
    init_logging();

    // Fails while a + b >= 10. a is shrunk against b = 8 first, then b against a = 2.
    let trees = (
        Candidate::unfold(8u32, |n| towards_zero(*n)),
        Candidate::unfold(8u32, |n| towards_zero(*n)),
    );
    let original = <(u32, u32)>::roots(&trees);
    let outcome = <(u32, u32)>::shrink_all(
        &trees,
        &original,
        &ShrinkConfig::new(ShrinkingMode::Unbounded),
        |(a, b)| {
            if a + b >= 10 {
                Err(PropertyError::assertion("sum is at least 10"))
            } else {
                Ok(())
            }
        },
    );

    assert_eq!(outcome.shrunk, (2, 8));
    assert_eq!(
        outcome.causes,
        vec![Some(PropertyError::assertion("sum is at least 10")), None]
    );
    assert_eq!(outcome.cause(), Some(&PropertyError::assertion("sum is at least 10")));
}

#[test]
fn test_driver_report_for_two_arguments() {
    init_logging();

    let config = TestConfig {
        seed: Some(99),
        ..TestConfig::default()
    };
    let result: PropertyResult<(u32, String)> = check_all_with_config(
        (
            unfold(|_| 50u32, |n| halve(*n)),
            ConstantGenerator::new("x".to_string()),
        ),
        |a: &u32, b: &String| *a < 10 || b.as_str() != "x",
        config,
    );

    let failure = result.unwrap_err().unwrap_failed();
    assert_eq!(failure.original_input, (50, "x".to_string()));
    assert_eq!(failure.shrunk_input, (12, "x".to_string()));
    assert_eq!(
        failure.to_string(),
        "Property failed after 1 attempts\n\
         \n\
         \tArg 0: 12 (shrunk from 50)\n\
         \tArg 1: \"x\"\n\
         \n\
         Caused by: property returned false\n\
         \n\
         Repeat this test by using seed 99\n"
    );
}

#[test]
fn test_three_arguments_shrink_in_order() {
    init_logging();

    let config = TestConfig {
        seed: Some(1),
        shrinking_mode: ShrinkingMode::Unbounded,
        ..TestConfig::default()
    };
    let result: PropertyResult<(u64, u64, u64)> = check_all_with_config(
        (
            unfold(|_| 40u64, |n| towards_zero(*n)),
            unfold(|_| 40u64, |n| towards_zero(*n)),
            unfold(|_| 40u64, |n| towards_zero(*n)),
        ),
        |a: &u64, b: &u64, c: &u64| a + b + c < 30,
        config,
    );

    let failure = result.unwrap_err().unwrap_failed();
    // b and c at 40 keep failing on their own, so a and then b drop to 0.
    assert_eq!(failure.shrunk_input, (0, 0, 30));
    assert!(failure.shrink_attempts > 0);
}
