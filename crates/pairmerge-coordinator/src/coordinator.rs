use tracing::{debug, info, warn};

use pairmerge_types::WorkerStats;
use pairmerge_worker::{MergeWorker, StepOutcome, WorkerResult};

use crate::report::MergeReport;

/// Default step budget for a job.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Anything the coordinator can drive.
pub trait Participant {
    fn step(&mut self) -> WorkerResult<StepOutcome>;
    fn stats(&self) -> WorkerStats;
}

impl Participant for MergeWorker {
    fn step(&mut self) -> WorkerResult<StepOutcome> {
        MergeWorker::step(self)
    }

    fn stats(&self) -> WorkerStats {
        MergeWorker::stats(self)
    }
}

/// Round-robin driver for two participants.
pub struct Coordinator<P> {
    workers: [P; 2],
}

impl<P: Participant> Coordinator<P> {
    pub fn new(a: P, b: P) -> Self {
        Self { workers: [a, b] }
    }

    /// Step each still-active participant once per round, `a` first, until
    /// both are done or `max_steps` steps have been taken.
    ///
    /// Running out of budget is reported as `success = false`. An error from
    /// either participant aborts the run.
    pub fn run(&mut self, max_steps: usize) -> WorkerResult<MergeReport> {
        let mut active = [true, true];
        let mut steps = 0;
        info!(max_steps, "merge started");

        'rounds: while active.iter().any(|a| *a) {
            for (i, worker) in self.workers.iter_mut().enumerate() {
                if !active[i] {
                    continue;
                }
                if steps >= max_steps {
                    break 'rounds;
                }
                active[i] = worker.step()?.more_work();
                steps += 1;
                if !active[i] {
                    debug!(worker = i, steps, "worker done");
                }
            }
        }

        let success = !active.iter().any(|a| *a);
        if success {
            info!(total_steps = steps, "merge complete");
        } else {
            warn!(total_steps = steps, max_steps, "step budget exhausted");
        }

        Ok(MergeReport {
            success,
            total_steps: steps,
            stats_a: self.workers[0].stats(),
            stats_b: self.workers[1].stats(),
        })
    }

    pub fn workers(&self) -> &[P; 2] {
        &self.workers
    }

    pub fn into_workers(self) -> [P; 2] {
        self.workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairmerge_types::WorkerId;
    use pairmerge_worker::WorkerError;

    /// Finishes after a fixed number of steps, or never.
    struct Scripted {
        remaining: Option<usize>,
        steps: u64,
        fail_at: Option<u64>,
    }

    impl Scripted {
        fn finishing_after(n: usize) -> Self {
            Self {
                remaining: Some(n),
                steps: 0,
                fail_at: None,
            }
        }

        fn never_finishing() -> Self {
            Self {
                remaining: None,
                steps: 0,
                fail_at: None,
            }
        }
    }

    impl Participant for Scripted {
        fn step(&mut self) -> WorkerResult<StepOutcome> {
            self.steps += 1;
            if self.fail_at == Some(self.steps) {
                return Err(WorkerError::ProtocolViolation {
                    worker: WorkerId::B,
                    reason: "scripted".into(),
                });
            }
            match &mut self.remaining {
                Some(0) => Ok(StepOutcome::Done),
                Some(n) => {
                    *n -= 1;
                    if *n == 0 {
                        Ok(StepOutcome::Done)
                    } else {
                        Ok(StepOutcome::Pending)
                    }
                }
                None => Ok(StepOutcome::Pending),
            }
        }

        fn stats(&self) -> WorkerStats {
            WorkerStats {
                comparisons: self.steps,
                ..WorkerStats::default()
            }
        }
    }

    #[test]
    fn finished_workers_are_not_stepped_again() {
        let mut c = Coordinator::new(Scripted::finishing_after(1), Scripted::finishing_after(4));
        let report = c.run(100).unwrap();
        assert!(report.success);
        assert_eq!(report.total_steps, 5);
        assert_eq!(report.stats_a.comparisons, 1);
        assert_eq!(report.stats_b.comparisons, 4);
    }

    #[test]
    fn livelock_is_reported_not_hung() {
        let mut c = Coordinator::new(Scripted::never_finishing(), Scripted::never_finishing());
        let report = c.run(7).unwrap();
        assert!(!report.success);
        assert_eq!(report.total_steps, 7);
        assert_eq!(report.stats_a.comparisons, 4);
        assert_eq!(report.stats_b.comparisons, 3);
    }

    #[test]
    fn zero_budget_takes_no_steps() {
        let mut c = Coordinator::new(Scripted::finishing_after(1), Scripted::finishing_after(1));
        let report = c.run(0).unwrap();
        assert!(!report.success);
        assert_eq!(report.total_steps, 0);
    }

    #[test]
    fn budget_exactly_sufficient() {
        let mut c = Coordinator::new(Scripted::finishing_after(2), Scripted::finishing_after(2));
        assert!(c.run(4).unwrap().success);
    }

    #[test]
    fn worker_error_aborts_the_run() {
        let mut failing = Scripted::never_finishing();
        failing.fail_at = Some(2);
        let mut c = Coordinator::new(Scripted::never_finishing(), failing);
        let err = c.run(100).unwrap_err();
        assert!(matches!(err, WorkerError::ProtocolViolation { .. }));
        let [a, b] = c.into_workers();
        assert_eq!(a.steps, 2);
        assert_eq!(b.steps, 2);
    }
}
