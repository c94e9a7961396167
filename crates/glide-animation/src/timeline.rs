//! Manual-clock scheduling of many stepped tweens.

use std::time::Duration;

use tracing::{debug, trace};

use crate::job::{StepOutcome, TweenJob};
use crate::TweenId;

struct Scheduled {
    job: TweenJob,
    /// Clock time at which the next frame is due.
    due_ms: u64,
}

/// Drives stepped jobs from an externally supplied clock.
///
/// Each call to [`tick`](Self::tick) renders at most one frame per job, like
/// one timer firing per job.
#[derive(Default)]
pub struct Timeline {
    jobs: Vec<Scheduled>,
    finished: Vec<TweenId>,
}

impl Timeline {
    /// Create a new timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a job. Its first frame is due at `now_ms`.
    pub fn add(&mut self, job: TweenJob, now_ms: u64) -> TweenId {
        let id = job.id();
        trace!(job = ?id, now_ms, "scheduled tween");
        self.jobs.push(Scheduled { job, due_ms: now_ms });
        id
    }

    /// Advance every job whose next frame is due. Returns whether any job is still running.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        for scheduled in &mut self.jobs {
            if scheduled.due_ms > now_ms {
                continue;
            }
            match scheduled.job.advance() {
                StepOutcome::Continue { delay } => {
                    scheduled.due_ms = now_ms.saturating_add(duration_ms(delay));
                }
                StepOutcome::Finished => self.finished.push(scheduled.job.id()),
            }
        }

        let before = self.jobs.len();
        self.jobs.retain(|s| !s.job.is_finished());
        if self.jobs.len() != before {
            debug!(
                finished = before - self.jobs.len(),
                running = self.jobs.len(),
                "timeline retired tweens"
            );
        }

        !self.jobs.is_empty()
    }

    /// When the earliest pending frame is due.
    pub fn next_due(&self) -> Option<u64> {
        self.jobs.iter().map(|s| s.due_ms).min()
    }

    /// Tick at each due time until nothing is running. Returns the final clock time.
    pub fn run_until_idle(&mut self, mut now_ms: u64) -> u64 {
        while let Some(due) = self.next_due() {
            now_ms = now_ms.max(due);
            self.tick(now_ms);
        }
        now_ms
    }

    /// IDs of jobs finished since the last call.
    pub fn take_finished(&mut self) -> Vec<TweenId> {
        std::mem::take(&mut self.finished)
    }

    /// Look up a running job.
    pub fn get(&self, id: TweenId) -> Option<&TweenJob> {
        self.jobs.iter().map(|s| &s.job).find(|job| job.id() == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("running", &self.jobs.len())
            .field("finished", &self.finished)
            .finish()
    }
}

fn duration_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
