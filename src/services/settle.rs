//! Bounded readiness wait between phases
//!
//! The control plane is eventually consistent: an uninstalled release or a
//! cleared finalizer may not be visible to the next list call yet. Instead of
//! sleeping for a fixed time, poll an observed condition with exponential
//! backoff until it holds or the deadline passes.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::SettleConfig;

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled { attempts: u32 },
    DeadlineExpired { attempts: u32 },
}

/// Poll `check` until it reports `true` or the deadline expires.
///
/// The first check runs immediately. Check errors end the wait and are
/// returned to the caller.
pub async fn wait_until<F, Fut, E>(
    policy: &SettleConfig,
    what: &str,
    mut check: F,
) -> Result<SettleOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let deadline = Instant::now() + policy.deadline;
    let mut interval = policy.initial_interval;
    let mut attempts = 0;

    loop {
        attempts += 1;
        if check().await? {
            debug!("{} settled after {} check(s)", what, attempts);
            return Ok(SettleOutcome::Settled { attempts });
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(SettleOutcome::DeadlineExpired { attempts });
        }

        debug!("Waiting {:?} for {}", interval, what);
        sleep(interval.min(deadline - now)).await;
        interval = next_interval(interval, policy);
    }
}

fn next_interval(current: Duration, policy: &SettleConfig) -> Duration {
    current
        .saturating_mul(policy.factor)
        .min(policy.max_interval)
}
