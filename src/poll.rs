//! Cooperative polling loop that drives a batch to drained.
//!
//! One bulk status check per tick covers every outstanding job, so the number
//! of network calls per tick is constant regardless of batch size and one
//! slow job cannot starve the others' status checks. The clock is injected so
//! tests simulate time instead of sleeping.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::api::SplitterApi;
use crate::batch::{BatchRegistry, JobEvent};
use crate::ui::PollProgress;

/// Time source for the polling loop.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    async fn pause(&self, interval: Duration);
}

/// Wall-clock time and real sleeping, used outside of tests.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn pause(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Polls the service until every job in the registry is terminal.
pub struct Poller<'a, A, C> {
    api: &'a A,
    clock: &'a C,
    interval: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl<'a, A: SplitterApi, C: Clock> Poller<'a, A, C> {
    pub fn new(api: &'a A, clock: &'a C, interval: Duration) -> Self {
        Self {
            api,
            clock,
            interval,
            deadline: None,
        }
    }

    /// Impose a deadline. On expiry every still-outstanding job becomes
    /// `TimedOut` and the loop stops; without one the loop waits as long as
    /// the service keeps jobs non-terminal.
    pub fn with_deadline(mut self, deadline: Option<DateTime<Utc>>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run the loop until the registry drains (or the deadline expires).
    ///
    /// Per tick: one bulk check over the outstanding ids, then each returned
    /// snapshot is applied to the registry. A failed check abandons the tick
    /// and is retried after the interval; it never marks any job as failed.
    /// Snapshots for ids outside the registry are ignored, and registry ids
    /// missing from a response are simply re-polled next tick.
    pub async fn drain(&self, registry: &mut BatchRegistry) {
        let total = registry.len();
        let progress = PollProgress::start(total);

        loop {
            if registry.is_drained() {
                break;
            }
            if let Some(deadline) = self.deadline
                && self.clock.now() >= deadline
            {
                let affected = registry.mark_timed_out(self.clock.now());
                progress.timed_out(affected);
                break;
            }

            let outstanding = registry.outstanding_ids();
            match self.api.check_status(&outstanding).await {
                Err(error) => progress.transient_error(&error.to_string()),
                Ok(snapshots) => {
                    let now = self.clock.now();
                    for (job_id, snapshot) in snapshots {
                        match snapshot {
                            Ok(snapshot) => match registry.apply(&job_id, snapshot, now) {
                                JobEvent::Started { .. } => progress.job_started(&job_id),
                                JobEvent::Succeeded => progress.job_succeeded(&job_id),
                                JobEvent::Failed { detail } => {
                                    progress.job_failed(&job_id, &detail);
                                }
                                JobEvent::Progressed { .. } | JobEvent::Ignored => {}
                            },
                            Err(error) => progress.protocol_error(&job_id, &error.to_string()),
                        }
                    }
                }
            }

            progress.update(registry.outstanding_ids().len(), total);
            if registry.is_drained() {
                break;
            }
            self.clock.pause(self.interval).await;
        }

        progress.finish();
    }
}
