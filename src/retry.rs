//! Deadline-bounded retry loop.
//!
//! The operation decides per attempt whether a failure may be retried. The
//! loop sleeps according to a [`Backoff`] between retryable failures, gives
//! up once the policy's timeout elapses, and stops early when the provider is
//! cancelled. In every failure case the last observed error is returned.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::info;

use crate::backoff::Backoff;

/// The outcome of one failed attempt.
#[derive(Debug)]
pub enum Attempt<E> {
    /// Transient; try again after waiting.
    Retry(E),
    /// Terminal; stop immediately.
    Abort(E),
}

/// Why a retry loop ended without success.
#[derive(Debug, Error)]
pub enum RetryFailure<E: fmt::Display> {
    /// An attempt failed terminally.
    #[error("{0}")]
    Aborted(E),
    /// The timeout elapsed while the operation kept failing transiently.
    #[error("timed out after {attempts} attempts in {elapsed:?}: {last}")]
    TimedOut {
        /// Attempts made.
        attempts: u32,
        /// Time spent in the loop.
        elapsed: Duration,
        /// Error of the final attempt.
        last: E,
    },
    /// The cancellation signal fired while waiting to retry.
    #[error("cancelled after {attempts} attempts: {last}")]
    Cancelled {
        /// Attempts made.
        attempts: u32,
        /// Error of the final attempt.
        last: E,
    },
}

impl<E: fmt::Display> RetryFailure<E> {
    /// The last underlying error, whatever ended the loop.
    pub fn into_last(self) -> E {
        match self {
            Self::Aborted(e) => e,
            Self::TimedOut { last, .. } | Self::Cancelled { last, .. } => last,
        }
    }

    /// Number of attempts made before the loop ended, when known.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Aborted(_) => None,
            Self::TimedOut { attempts, .. } | Self::Cancelled { attempts, .. } => Some(*attempts),
        }
    }
}

/// Timeout and wait schedule for one kind of retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Name used in log lines.
    pub label: &'static str,
    /// Overall deadline, measured from the first attempt.
    pub timeout: Duration,
    /// Wait between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(label: &'static str, timeout: Duration, backoff: Backoff) -> Self {
        Self {
            label,
            timeout,
            backoff,
        }
    }
}

/// Receiving end of the provider's stop signal.
///
/// A signal whose sender is dropped never fires.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Wrap a watch receiver; the signal fires once it observes `true`.
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Whether the signal has already fired.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the signal fires.
    pub async fn cancelled(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

/// Run `op` until it succeeds, fails terminally, the policy's timeout
/// elapses, or `cancel` fires.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut cancel: CancelSignal,
    mut op: F,
) -> Result<T, RetryFailure<E>>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
{
    let start = Instant::now();
    let deadline = start + policy.timeout;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(Attempt::Abort(err)) => return Err(RetryFailure::Aborted(err)),
            Err(Attempt::Retry(err)) => err,
        };

        if cancel.is_cancelled() {
            return Err(RetryFailure::Cancelled {
                attempts,
                last: err,
            });
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(RetryFailure::TimedOut {
                attempts,
                elapsed: now - start,
                last: err,
            });
        }

        let wait = policy.backoff.next_delay(attempts - 1);
        info!(
            operation = policy.label,
            attempt = attempts,
            wait = ?wait,
            error = %err,
            "retrying after transient failure"
        );

        let wake = (now + wait).min(deadline);
        tokio::select! {
            _ = sleep_until(wake) => {}
            _ = cancel.cancelled() => {
                return Err(RetryFailure::Cancelled { attempts, last: err });
            }
        }

        if wake >= deadline {
            return Err(RetryFailure::TimedOut {
                attempts,
                elapsed: Instant::now() - start,
                last: err,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(timeout_secs: u64) -> RetryPolicy {
        RetryPolicy::new(
            "test",
            Duration::from_secs(timeout_secs),
            Backoff::capped(Duration::from_secs(1), Duration::from_secs(4)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<u32, RetryFailure<String>> =
            retry(&policy(60), CancelSignal::never(), || {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(Attempt::Retry(format!("not yet {}", n)))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = retry(&policy(60), CancelSignal::never(), || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Attempt::Abort("fatal".to_string()))
            }
        })
        .await;
        let failure = result.unwrap_err();
        assert!(matches!(failure, RetryFailure::Aborted(ref e) if e == "fatal"));
        assert_eq!(failure.attempts(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_last_error() {
        let start = Instant::now();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = retry(&policy(30), CancelSignal::never(), || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(Attempt::Retry(format!("attempt {}", n)))
            }
        })
        .await;

        let elapsed = start.elapsed();
        let attempts = calls.load(Ordering::SeqCst);
        match result.unwrap_err() {
            RetryFailure::TimedOut {
                attempts: reported,
                last,
                ..
            } => {
                assert_eq!(reported, attempts);
                assert_eq!(last, format!("attempt {}", attempts));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed < Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait() {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            retry::<(), _, _, _>(&policy(600), CancelSignal::new(rx), || async {
                Err(Attempt::Retry("still busy".to_string()))
            })
            .await
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        tx.send(true).unwrap();

        let failure = handle.await.unwrap().unwrap_err();
        assert!(matches!(failure, RetryFailure::Cancelled { .. }));
        assert_eq!(failure.into_last(), "still busy");
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_wait() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let result: Result<(), _> = retry(&policy(600), CancelSignal::new(rx), || async {
            Err(Attempt::Retry("busy".to_string()))
        })
        .await;
        assert!(matches!(
            result.unwrap_err(),
            RetryFailure::Cancelled { attempts: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_dropped_sender_never_cancels() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let signal = CancelSignal::new(rx);
        assert!(!signal.is_cancelled());
        let mut signal = signal;
        let fired = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(fired.is_err());
    }

    #[derive(Default)]
    struct Messages(Arc<std::sync::Mutex<Vec<String>>>);

    struct MessageVisitor<'a>(&'a mut Option<String>);

    impl tracing::field::Visit for MessageVisitor<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                *self.0 = Some(format!("{:?}", value));
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Messages {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut message = None;
            event.record(&mut MessageVisitor(&mut message));
            if let Some(message) = message {
                self.0.lock().unwrap().push(message);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_log_message_is_plain() {
        use tracing_subscriber::prelude::*;

        let messages = Messages::default();
        let seen = Arc::clone(&messages.0);
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(messages));

        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), RetryFailure<String>> =
            retry(&policy(60), CancelSignal::never(), || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Attempt::Retry("busy".to_string()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        assert!(result.is_ok());

        let seen = seen.lock().unwrap();
        assert!(seen.contains(&"retrying after transient failure".to_string()));
        assert!(seen.iter().all(|m| !m.contains("test failed")));
    }
}
