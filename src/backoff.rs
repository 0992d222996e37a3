use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Ordered wait times between attempts. An operation run under a schedule
/// with `n` delays is tried at most `n + 1` times.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    pub delays: Vec<Duration>,
}

impl RetrySchedule {
    /// Same delay between every attempt (HTTP fetch style).
    pub fn fixed(retries: u8, delay: Duration) -> Self {
        Self {
            delays: vec![delay; retries as usize],
        }
    }

    /// Escalating delays, shortest first (rate-limited API style).
    pub fn tiered(delays: &[Duration]) -> Self {
        Self {
            delays: delays.to_vec(),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }
}

/// Terminal outcome of a retried operation.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The classifier judged the error non-retryable; no further attempts
    /// were made.
    Fatal(E),
    /// Every attempt failed with a retryable error. Distinguishable so a
    /// caller batch can stop submitting further work while keeping what it
    /// already produced (e.g. a quota-exhausted collaborator).
    Exhausted(E),
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Fatal(err) => write!(f, "non-retryable failure: {err}"),
            RetryError::Exhausted(err) => write!(f, "retries exhausted: {err}"),
        }
    }
}

impl<E: fmt::Display + fmt::Debug> std::error::Error for RetryError<E> {}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(err) | RetryError::Exhausted(err) => err,
        }
    }
}

/// Runs `op` until it succeeds, the classifier rejects the error, or the
/// schedule runs out. Sleeps the scheduled delay between attempts.
pub fn retry_with_schedule<T, E, Op, Classify>(
    schedule: &RetrySchedule,
    is_retryable: Classify,
    mut op: Op,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    Op: FnMut() -> Result<T, E>,
    Classify: Fn(&E) -> bool,
{
    let attempts = schedule.max_attempts();

    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retryable(&err) {
                    return Err(RetryError::Fatal(err));
                }
                if attempt == attempts {
                    return Err(RetryError::Exhausted(err));
                }
                let delay = schedule.delays[attempt - 1];
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "attempt failed; retrying");
                std::thread::sleep(delay);
            }
        }
    }

    unreachable!("retry loop returns on the final attempt")
}
