use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use pairmerge_store::{
    parse_values, FileMailbox, FileSink, FileStateStore, InMemoryMailbox, InMemorySink,
    InMemoryStateStore, MailboxTransport, OutputSink, StateStore, StoreResult,
};
use pairmerge_types::WorkerId;
use pairmerge_worker::{MergeWorker, WorkerConfig, WorkerEnv, WorkerResult};

use crate::coordinator::Coordinator;
use crate::report::MergeReport;

/// Two workers wired crosswise over shared stores.
pub struct MergeJob {
    coordinator: Coordinator<MergeWorker>,
}

impl MergeJob {
    /// Build both workers. Existing state in `states` is picked up, so a
    /// job rebuilt over the same stores resumes where the last one stopped.
    pub fn new(
        run_a: Vec<i64>,
        run_b: Vec<i64>,
        transport: Arc<dyn MailboxTransport>,
        sink: Arc<dyn OutputSink>,
        states: Arc<dyn StateStore>,
        config: WorkerConfig,
    ) -> WorkerResult<Self> {
        let env = |id: WorkerId| {
            WorkerEnv::crosswise(id, transport.clone(), sink.clone(), states.clone())
        };
        let a = MergeWorker::new(WorkerId::A, run_a, env(WorkerId::A), config.clone())?;
        let b = MergeWorker::new(WorkerId::B, run_b, env(WorkerId::B), config)?;
        Ok(Self {
            coordinator: Coordinator::new(a, b),
        })
    }

    /// A job over fresh in-memory stores. Returns the sink for reading the
    /// result back.
    pub fn in_memory(
        run_a: Vec<i64>,
        run_b: Vec<i64>,
        config: WorkerConfig,
    ) -> WorkerResult<(Self, Arc<InMemorySink>)> {
        let sink = Arc::new(InMemorySink::new());
        let job = Self::new(
            run_a,
            run_b,
            Arc::new(InMemoryMailbox::new()),
            sink.clone(),
            Arc::new(InMemoryStateStore::new()),
            config,
        )?;
        Ok((job, sink))
    }

    pub fn run(&mut self, max_steps: usize) -> WorkerResult<MergeReport> {
        self.coordinator.run(max_steps)
    }

    pub fn workers(&self) -> &[MergeWorker; 2] {
        self.coordinator.workers()
    }
}

/// On-disk layout of a job:
///
/// ```text
/// <root>/A_to_B.msg      slot read by B
/// <root>/B_to_A.msg      slot read by A
/// <root>/state_a.json
/// <root>/state_b.json
/// <root>/output.txt
/// ```
#[derive(Clone, Debug)]
pub struct JobDir {
    root: PathBuf,
}

impl JobDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join("output.txt")
    }

    /// Clear slots, states and output so a new job starts from scratch.
    pub fn reset(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;
        let transport = self.transport()?;
        let states = self.states()?;
        for id in [WorkerId::A, WorkerId::B] {
            transport.clear(&id.outbound_slot())?;
            states.clear(id)?;
        }
        FileSink::create(self.output_path())?;
        info!(root = %self.root.display(), "job directory reset");
        Ok(())
    }

    pub fn transport(&self) -> StoreResult<FileMailbox> {
        FileMailbox::open(&self.root)
    }

    pub fn states(&self) -> StoreResult<FileStateStore> {
        FileStateStore::open(&self.root)
    }

    /// Output sink opened for appending; existing output is kept.
    pub fn sink(&self) -> StoreResult<FileSink> {
        FileSink::open(self.output_path())
    }

    /// Environment for a single worker, for stepping it in isolation.
    pub fn env(&self, id: WorkerId) -> StoreResult<WorkerEnv> {
        Ok(WorkerEnv::crosswise(
            id,
            Arc::new(self.transport()?),
            Arc::new(self.sink()?),
            Arc::new(self.states()?),
        ))
    }

    /// Build a job over this directory, resuming any persisted state.
    pub fn job(
        &self,
        run_a: Vec<i64>,
        run_b: Vec<i64>,
        config: WorkerConfig,
    ) -> WorkerResult<MergeJob> {
        MergeJob::new(
            run_a,
            run_b,
            Arc::new(self.transport()?),
            Arc::new(self.sink()?),
            Arc::new(self.states()?),
            config,
        )
    }

    /// Parse the output file back into integers.
    pub fn read_output(&self, delimiter: &str) -> StoreResult<Vec<i64>> {
        let text = self.sink()?.contents()?;
        parse_values(&text, delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn merged(a: &[i64], b: &[i64]) -> Vec<i64> {
        let mut all: Vec<i64> = a.iter().chain(b).copied().collect();
        all.sort();
        all
    }

    fn run_in_memory(a: Vec<i64>, b: Vec<i64>, chunk_size: usize) -> (MergeReport, Vec<i64>) {
        let (mut job, sink) =
            MergeJob::in_memory(a, b, WorkerConfig::with_chunk_size(chunk_size)).unwrap();
        let report = job.run(10_000).unwrap();
        (report, parse_values(&sink.contents(), ", ").unwrap())
    }

    #[test]
    fn even_and_odd() {
        let a: Vec<i64> = (0..100).step_by(2).collect();
        let b: Vec<i64> = (1..100).step_by(2).collect();
        let (report, output) = run_in_memory(a, b, 11);
        assert!(report.success);
        assert_eq!(output, (0..100).collect::<Vec<_>>());
        assert_eq!(report.combined_stats().values_emitted, 100);
    }

    #[test]
    fn disjoint_ranges_high_first() {
        let (report, output) = run_in_memory((1000..6000).collect(), (0..1000).collect(), 11);
        assert!(report.success);
        assert_eq!(output, (0..6000).collect::<Vec<_>>());
    }

    #[test]
    fn disjoint_ranges_low_first() {
        let (report, output) = run_in_memory((0..100).collect(), (100..600).collect(), 11);
        assert!(report.success);
        assert_eq!(output, (0..600).collect::<Vec<_>>());
    }

    #[test]
    fn small_interleaved() {
        let a = vec![1, 5, 9, 13, 17, 21];
        let b = vec![2, 6, 10, 14, 18, 22];
        let (report, output) = run_in_memory(a, b, 11);
        assert!(report.success);
        assert_eq!(output, vec![1, 2, 5, 6, 9, 10, 13, 14, 17, 18, 21, 22]);
    }

    #[test]
    fn singletons_and_empties() {
        for (a, b) in [
            (vec![], vec![]),
            (vec![7], vec![]),
            (vec![], vec![7]),
            (vec![3], vec![3]),
            (vec![9], vec![-9]),
        ] {
            let expected = merged(&a, &b);
            let (report, output) = run_in_memory(a, b, 11);
            assert!(report.success);
            assert_eq!(output, expected);
        }
    }

    #[test]
    fn every_value_emitted_exactly_once() {
        let a: Vec<i64> = (0..300).map(|v| v / 3).collect();
        let b: Vec<i64> = (0..200).map(|v| v / 2).collect();
        let (report, output) = run_in_memory(a.clone(), b.clone(), 7);
        assert!(report.success);
        assert_eq!(report.combined_stats().values_emitted, 500);
        assert_eq!(output, merged(&a, &b));
    }

    #[test]
    fn budget_exhaustion_is_not_an_error() {
        let (mut job, _sink) = MergeJob::in_memory(
            (0..500).collect(),
            (0..500).collect(),
            WorkerConfig::default(),
        )
        .unwrap();
        let report = job.run(5).unwrap();
        assert!(!report.success);
        assert_eq!(report.total_steps, 5);
    }

    #[test]
    fn rebuilt_job_resumes_after_budget_exhaustion() {
        let transport: Arc<InMemoryMailbox> = Arc::new(InMemoryMailbox::new());
        let sink = Arc::new(InMemorySink::new());
        let states: Arc<InMemoryStateStore> = Arc::new(InMemoryStateStore::new());
        let a: Vec<i64> = (0..200).map(|v| v * 2).collect();
        let b: Vec<i64> = (0..150).map(|v| v * 3).collect();
        let build = || {
            MergeJob::new(
                a.clone(),
                b.clone(),
                transport.clone(),
                sink.clone(),
                states.clone(),
                WorkerConfig::with_chunk_size(5),
            )
            .unwrap()
        };

        let first = build().run(9).unwrap();
        assert!(!first.success);

        let second = build().run(10_000).unwrap();
        assert!(second.success);
        assert_eq!(parse_values(&sink.contents(), ", ").unwrap(), merged(&a, &b));
    }

    #[test]
    fn file_backed_job_matches_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let job_dir = JobDir::new(dir.path().join("job"));
        job_dir.reset().unwrap();

        let mut a: Vec<i64> = (0..90).map(|v| v * 5 % 97).collect();
        a.sort();
        let b: Vec<i64> = (0..60).map(|v| v * 2 - 30).collect();

        let mut job = job_dir.job(a.clone(), b.clone(), WorkerConfig::default()).unwrap();
        let report = job.run(10_000).unwrap();
        assert!(report.success);

        let (memory_report, memory_output) = run_in_memory(a.clone(), b.clone(), 11);
        assert_eq!(report.total_steps, memory_report.total_steps);
        assert_eq!(job_dir.read_output(", ").unwrap(), memory_output);
        assert_eq!(memory_output, merged(&a, &b));
        assert!(job_dir.states().unwrap().state_path(WorkerId::A).exists());
    }

    #[test]
    fn reset_clears_previous_job() {
        let dir = tempfile::tempdir().unwrap();
        let job_dir = JobDir::new(dir.path());
        job_dir.reset().unwrap();
        job_dir.job(vec![1, 2, 3], vec![4], WorkerConfig::default()).unwrap().run(100).unwrap();
        assert_eq!(job_dir.read_output(", ").unwrap(), vec![1, 2, 3, 4]);

        job_dir.reset().unwrap();
        assert!(job_dir.read_output(", ").unwrap().is_empty());
        assert!(job_dir.states().unwrap().load(WorkerId::A).unwrap().is_none());
        assert!(job_dir.transport().unwrap().read("B_to_A").unwrap().is_none());
    }

    #[test]
    fn report_serializes_to_json() {
        let (report, _) = run_in_memory(vec![1], vec![2], 11);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["stats_a"]["messages_sent"].is_number());
    }

    proptest! {
        #[test]
        fn output_is_the_sorted_merge(
            mut a in proptest::collection::vec(-1000i64..1000, 0..120),
            mut b in proptest::collection::vec(-1000i64..1000, 0..120),
            chunk_size in 1usize..16,
        ) {
            a.sort();
            b.sort();
            let expected = merged(&a, &b);
            let (report, output) = run_in_memory(a.clone(), b.clone(), chunk_size);
            prop_assert!(report.success);
            prop_assert_eq!(report.combined_stats().values_emitted as usize, expected.len());
            prop_assert_eq!(output, expected);
        }

        #[test]
        fn steps_bounded_by_chunks(
            len_a in 0usize..400,
            len_b in 0usize..400,
            chunk_size in 1usize..20,
        ) {
            let a: Vec<i64> = (0..len_a as i64).map(|v| v * 2).collect();
            let b: Vec<i64> = (0..len_b as i64).map(|v| v * 2 + 1).collect();
            let (report, _) = run_in_memory(a, b, chunk_size);
            prop_assert!(report.success);
            let bound = len_a.div_ceil(chunk_size) + len_b.div_ceil(chunk_size) + 2;
            prop_assert!(
                report.total_steps <= bound,
                "{} steps exceed bound {}", report.total_steps, bound
            );
        }
    }
}
