//! Redundant-request racing.
//!
//! The upstream API drops or stalls a noticeable share of requests. Instead
//! of retrying one request in sequence, a race sends the same idempotent GET
//! through `fanout` independent attempts at once and keeps the first body
//! that arrives. A single wall-clock deadline bounds the whole race.
//!
//! Resolution rules:
//! - the first attempt to read a full body wins; HTTP status is not checked
//! - once the race resolves every other attempt is aborted and its result,
//!   if any, is dropped unread
//! - failed attempts are recorded but never end the race on their own,
//!   unless [`RaceOptions::fail_fast`] is set and every attempt has failed
//!
//! Aborting an attempt is cooperative: the task stops at its next await
//! point, and the socket is closed when its client is dropped.

use std::{fmt, future::Future, sync::Arc};

use reqwest::Url;
use tokio::{task::JoinSet, time::sleep};

use crate::{transport::TransportConfig, BandwagonError, RaceOptions, Result};

/// An immutable GET request shared read-only by every attempt of a race.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTemplate {
    url: Url,
}

impl RequestTemplate {
    /// Creates a GET template for an already parsed URL.
    pub fn get(url: Url) -> Self {
        Self { url }
    }

    /// Parses `url` into a GET template.
    pub fn parse(url: &str) -> Result<Self> {
        let url =
            Url::parse(url).map_err(|err| BandwagonError::InvalidUrl(format!("{url}: {err}")))?;
        Ok(Self::get(url))
    }

    /// Target URL of the request.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Races `request` over freshly built default transports.
pub async fn race(request: &RequestTemplate, options: &RaceOptions) -> Result<Vec<u8>> {
    race_via(request, options, &TransportConfig::default()).await
}

/// Races `request`, building one client per attempt from `transport`.
pub async fn race_via(
    request: &RequestTemplate,
    options: &RaceOptions,
    transport: &TransportConfig,
) -> Result<Vec<u8>> {
    let request = Arc::new(request.clone());
    let transport = Arc::new(transport.clone());

    race_with(options, move |_| {
        let request = Arc::clone(&request);
        let transport = Arc::clone(&transport);
        async move { fetch(&request, &transport).await }
    })
    .await
}

async fn fetch(request: &RequestTemplate, transport: &TransportConfig) -> Result<Vec<u8>> {
    let http = transport.build()?;
    let response = http
        .get(request.url().clone())
        .send()
        .await
        .map_err(BandwagonError::Transport)?;
    let body = response.bytes().await.map_err(BandwagonError::Transport)?;
    Ok(body.to_vec())
}

/// Runs `fanout` attempts produced by `make_attempt` and returns the first
/// successful payload.
///
/// `make_attempt` receives the launch index of the attempt. Attempt errors
/// only need to be displayable; they are kept for diagnostics and never
/// returned as-is.
///
/// # Errors
///
/// - [`BandwagonError::Timeout`] when the deadline elapses first
/// - [`BandwagonError::AllAttemptsFailed`] when `fail_fast` is enabled and
///   every attempt failed before the deadline
pub async fn race_with<F, Fut, E>(options: &RaceOptions, mut make_attempt: F) -> Result<Vec<u8>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = std::result::Result<Vec<u8>, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let fanout = options.effective_fanout();
    let deadline_ms = u64::try_from(options.deadline.as_millis()).unwrap_or(u64::MAX);

    // Dropping the set aborts whatever is still in flight.
    let mut attempts = JoinSet::new();
    for index in 0..fanout {
        attempts.spawn(make_attempt(index));
    }

    let deadline = sleep(options.deadline);
    tokio::pin!(deadline);

    let mut failed = 0usize;
    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            joined = attempts.join_next(), if failed < fanout => {
                let failure = match joined {
                    Some(Ok(Ok(body))) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            failed,
                            fanout,
                            bytes = body.len(),
                            "race won, aborting remaining attempts"
                        );
                        attempts.abort_all();
                        return Ok(body);
                    }
                    Some(Ok(Err(err))) => Some(err.to_string()),
                    // A panicked attempt is just another failed attempt.
                    Some(Err(err)) => Some(err.to_string()),
                    None => None,
                };

                match failure {
                    Some(error) => {
                        failed += 1;
                        #[cfg(feature = "tracing")]
                        tracing::debug!(failed, fanout, error = %error, "race attempt failed");
                        last_error = Some(error);
                    }
                    // The set is drained; nothing is left to wait for.
                    None => failed = fanout,
                }

                if failed >= fanout && options.fail_fast {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(fanout, "every race attempt failed, failing fast");
                    return Err(BandwagonError::AllAttemptsFailed {
                        attempts: fanout,
                        last_error,
                    });
                }
            }
            () = &mut deadline => {
                #[cfg(feature = "tracing")]
                tracing::debug!(deadline_ms, failed, fanout, "race deadline elapsed");
                attempts.abort_all();
                return Err(BandwagonError::Timeout {
                    deadline_ms,
                    last_error,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use tokio::time::{sleep, Instant};

    use super::{race_with, RequestTemplate};
    use crate::{BandwagonError, RaceOptions};

    type AttemptResult = std::result::Result<Vec<u8>, String>;

    fn options(fanout: usize) -> RaceOptions {
        RaceOptions::default().fanout(fanout)
    }

    async fn respond_after(delay_ms: u64, body: &'static str) -> AttemptResult {
        sleep(Duration::from_millis(delay_ms)).await;
        Ok(body.as_bytes().to_vec())
    }

    async fn fail_after(delay_ms: u64, message: &'static str) -> AttemptResult {
        sleep(Duration::from_millis(delay_ms)).await;
        Err(message.to_owned())
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_wins_without_waiting_for_slow_attempts() {
        let started = Instant::now();

        let body = race_with(&options(5), |index| async move {
            if index == 3 {
                respond_after(100, r#"{"error":0}"#).await
            } else {
                respond_after(5_000, "slow").await
            }
        })
        .await
        .expect("race must be won by the fast attempt");

        assert_eq!(body, br#"{"error":0}"#.to_vec());
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_attempts_time_out_at_deadline() {
        let started = Instant::now();

        let err = race_with(&options(5), |_| respond_after(10_000, "late"))
            .await
            .expect_err("race must time out");

        let elapsed = started.elapsed();
        assert!(matches!(
            err,
            BandwagonError::Timeout {
                deadline_ms: 3_000,
                last_error: None
            }
        ));
        assert!(elapsed >= Duration::from_millis(3_000));
        assert!(elapsed < Duration::from_millis(3_100));
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_failure_still_waits_for_deadline_by_default() {
        let started = Instant::now();

        let err = race_with(&options(1), |_| fail_after(0, "connection refused"))
            .await
            .expect_err("race must time out");

        assert!(started.elapsed() >= Duration::from_millis(3_000));
        match err {
            BandwagonError::Timeout { last_error, .. } => {
                assert_eq!(last_error.as_deref(), Some("connection refused"));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_resolves_once_every_attempt_failed() {
        let started = Instant::now();
        let opts = options(4).fail_fast(true);

        let err = race_with(&opts, |_| fail_after(10, "dns failure"))
            .await
            .expect_err("race must fail");

        assert!(started.elapsed() < Duration::from_millis(100));
        match err {
            BandwagonError::AllAttemptsFailed {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(last_error.as_deref(), Some("dns failure"));
            }
            other => panic!("expected all-attempts-failed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_counts_panics_and_errors_once_each() {
        let opts = options(2).fail_fast(true);

        let err = race_with(&opts, |index| async move {
            if index == 0 {
                panic!("attempt blew up");
            }
            fail_after(20, "late error").await
        })
        .await
        .expect_err("race must fail");

        match err {
            BandwagonError::AllAttemptsFailed {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(last_error.as_deref(), Some("late error"));
            }
            other => panic!("expected all-attempts-failed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_still_takes_a_late_success() {
        let opts = options(3).fail_fast(true);

        let body = race_with(&opts, |index| async move {
            if index == 2 {
                respond_after(500, "ok").await
            } else {
                fail_after(0, "reset").await
            }
        })
        .await
        .expect("the surviving attempt must win");

        assert_eq!(body, b"ok".to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn losing_attempts_never_finish_after_a_win() {
        let finished = Arc::new(AtomicUsize::new(0));

        let body = race_with(&options(8), |index| {
            let finished = Arc::clone(&finished);
            async move {
                let delay = if index == 0 { 50 } else { 1_000 };
                sleep(Duration::from_millis(delay)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(format!("attempt-{index}").into_bytes())
            }
        })
        .await
        .expect("race must be won");

        assert_eq!(body, b"attempt-0".to_vec());

        sleep(Duration::from_millis(5_000)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn simultaneous_successes_deliver_exactly_one_payload() {
        let body = race_with(&options(10), |index| async move {
            sleep(Duration::from_millis(50)).await;
            Ok::<_, String>(vec![index as u8])
        })
        .await
        .expect("race must be won");

        assert_eq!(body.len(), 1);
        assert!(body[0] < 10);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_attempt_counts_as_failure() {
        let body = race_with(&options(2), |index| async move {
            if index == 0 {
                panic!("attempt blew up");
            }
            respond_after(10, "survivor").await
        })
        .await
        .expect("healthy attempt must win");

        assert_eq!(body, b"survivor".to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_fanout_launches_a_single_attempt() {
        let launched = Arc::new(AtomicUsize::new(0));

        let body = race_with(&options(0), |_| {
            launched.fetch_add(1, Ordering::SeqCst);
            respond_after(0, "only")
        })
        .await
        .expect("single attempt must win");

        assert_eq!(body, b"only".to_vec());
        assert_eq!(launched.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn template_rejects_relative_url() {
        let err = RequestTemplate::parse("v1/getServiceInfo").expect_err("must fail");
        assert!(matches!(err, BandwagonError::InvalidUrl(_)));
    }
}
