//! Network-idle detection for page readiness.

use std::{collections::HashSet, time::Duration};

use futures::{Stream, StreamExt, pin_mut};
use tokio::time::{Instant, sleep_until};

/// One network event observed on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NetworkActivity {
    Started(String),
    Finished(String),
}

/// When a page counts as idle: at most `max_inflight` requests outstanding for
/// `quiet_period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdlePolicy {
    pub quiet_period: Duration,
    pub max_inflight: usize,
}

impl Default for IdlePolicy {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(500),
            max_inflight: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdleOutcome {
    Idle,
    /// The event source ended before the page went quiet.
    Closed,
}

/// Wait until `activity` has stayed within `policy` for its quiet period.
///
/// Never returns while too many requests are in flight; callers bound the
/// wait with their own timeout.
pub(crate) async fn wait_for_network_idle<S>(activity: S, policy: IdlePolicy) -> IdleOutcome
where
    S: Stream<Item = NetworkActivity>,
{
    pin_mut!(activity);
    let mut inflight: HashSet<String> = HashSet::new();
    let mut deadline = Some(Instant::now() + policy.quiet_period);

    loop {
        let event = match deadline {
            Some(at) => {
                tokio::select! {
                    event = activity.next() => event,
                    () = sleep_until(at) => return IdleOutcome::Idle,
                }
            }
            None => activity.next().await,
        };

        let Some(event) = event else {
            return IdleOutcome::Closed;
        };
        match event {
            NetworkActivity::Started(id) => {
                inflight.insert(id);
            }
            NetworkActivity::Finished(id) => {
                inflight.remove(&id);
            }
        }

        let quiet = inflight.len() <= policy.max_inflight;
        deadline = match (deadline, quiet) {
            (Some(at), true) => Some(at),
            (None, true) => Some(Instant::now() + policy.quiet_period),
            (_, false) => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use futures::{channel::mpsc, stream};
    use tokio::time::{sleep, timeout};

    use super::*;

    fn started(id: &str) -> NetworkActivity {
        NetworkActivity::Started(id.to_string())
    }

    fn finished(id: &str) -> NetworkActivity {
        NetworkActivity::Finished(id.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_page_is_idle_after_quiet_period() {
        let begin = Instant::now();
        let outcome =
            wait_for_network_idle(stream::pending::<NetworkActivity>(), IdlePolicy::default())
                .await;
        assert_eq!(outcome, IdleOutcome::Idle);
        let elapsed = begin.elapsed();
        assert!(elapsed >= Duration::from_millis(500) && elapsed < Duration::from_millis(510));
    }

    #[tokio::test(start_paused = true)]
    async fn outstanding_request_blocks_idle() {
        let activity = stream::iter(vec![started("a")]).chain(stream::pending());
        let waited = timeout(
            Duration::from_secs(10),
            wait_for_network_idle(activity, IdlePolicy::default()),
        )
        .await;
        assert!(waited.is_err(), "page must not be idle with a request in flight");
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_period_restarts_after_last_request_finishes() {
        let (tx, rx) = mpsc::unbounded();
        let begin = Instant::now();
        tokio::spawn(async move {
            let _ = tx.unbounded_send(started("a"));
            let _ = tx.unbounded_send(started("b"));
            sleep(Duration::from_millis(100)).await;
            let _ = tx.unbounded_send(finished("a"));
            sleep(Duration::from_millis(100)).await;
            let _ = tx.unbounded_send(finished("b"));
            // keep the channel open so only the timer can end the wait
            sleep(Duration::from_secs(60)).await;
            drop(tx);
        });

        let outcome = wait_for_network_idle(rx, IdlePolicy::default()).await;
        assert_eq!(outcome, IdleOutcome::Idle);
        let elapsed = begin.elapsed();
        assert!(elapsed >= Duration::from_millis(700) && elapsed < Duration::from_millis(710));
    }

    #[tokio::test(start_paused = true)]
    async fn tolerated_inflight_requests_count_as_quiet() {
        let policy = IdlePolicy {
            quiet_period: Duration::from_millis(500),
            max_inflight: 2,
        };
        let activity = stream::iter(vec![started("a"), started("b")]).chain(stream::pending());
        let outcome = wait_for_network_idle(activity, policy).await;
        assert_eq!(outcome, IdleOutcome::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_source_ends_the_wait() {
        let activity = stream::iter(vec![started("a")]);
        let outcome = wait_for_network_idle(activity, IdlePolicy::default()).await;
        assert_eq!(outcome, IdleOutcome::Closed);
    }
}
