use gonggo::backoff::{RetryError, RetrySchedule, retry_with_schedule};
use std::cell::Cell;
use std::time::Duration;

#[test]
fn succeeds_without_consuming_the_schedule() {
    let schedule = RetrySchedule::fixed(3, Duration::ZERO);
    let attempts = Cell::new(0u32);

    let result: Result<&str, RetryError<&str>> = retry_with_schedule(&schedule, |_| true, || {
        attempts.set(attempts.get() + 1);
        Ok("ok")
    });

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(attempts.get(), 1);
}

#[test]
fn retries_until_the_schedule_is_exhausted() {
    let schedule = RetrySchedule::fixed(2, Duration::ZERO);
    let attempts = Cell::new(0u32);

    let result: Result<(), _> = retry_with_schedule(&schedule, |_| true, || {
        attempts.set(attempts.get() + 1);
        Err("boom")
    });

    // Two delays allow three attempts in total.
    assert_eq!(attempts.get(), 3);
    assert!(matches!(result, Err(RetryError::Exhausted("boom"))));
}

#[test]
fn fatal_errors_stop_immediately() {
    let schedule = RetrySchedule::fixed(5, Duration::ZERO);
    let attempts = Cell::new(0u32);

    let result: Result<(), _> = retry_with_schedule(&schedule, |err: &&str| *err != "fatal", || {
        attempts.set(attempts.get() + 1);
        Err("fatal")
    });

    assert_eq!(attempts.get(), 1);
    assert!(matches!(result, Err(RetryError::Fatal("fatal"))));
}

#[test]
fn recovery_mid_schedule_returns_the_value() {
    let schedule = RetrySchedule::tiered(&[Duration::ZERO, Duration::ZERO, Duration::ZERO]);
    let attempts = Cell::new(0u32);

    let result = retry_with_schedule(&schedule, |_| true, || {
        attempts.set(attempts.get() + 1);
        if attempts.get() < 3 { Err("flaky") } else { Ok(42) }
    });

    assert_eq!(result.unwrap(), 42);
    assert_eq!(attempts.get(), 3);
}

#[test]
fn error_kinds_unwrap_to_the_underlying_error() {
    let fatal: RetryError<&str> = RetryError::Fatal("a");
    let exhausted: RetryError<&str> = RetryError::Exhausted("b");
    assert_eq!(fatal.into_inner(), "a");
    assert_eq!(exhausted.into_inner(), "b");

    assert_eq!(RetrySchedule::fixed(2, Duration::ZERO).max_attempts(), 3);
}
