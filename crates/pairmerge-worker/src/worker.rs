use pairmerge_types::{Message, PersistedState, Phase, WorkerId, WorkerStats};
use tracing::debug;

use crate::config::WorkerConfig;
use crate::env::WorkerEnv;
use crate::error::{WorkerError, WorkerResult};

/// Result of a single [`MergeWorker::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The worker is not finished; step it again.
    Pending,
    /// The worker reached `Finished`. Further steps are no-ops.
    Done,
}

impl StepOutcome {
    pub fn more_work(self) -> bool {
        self == Self::Pending
    }
}

/// Values written during one step, batched into a single sink append.
struct Emission<'a> {
    buf: String,
    separator_seen: bool,
    delimiter: &'a str,
    count: u64,
}

impl<'a> Emission<'a> {
    fn new(separator_seen: bool, delimiter: &'a str) -> Self {
        Self {
            buf: String::new(),
            separator_seen,
            delimiter,
            count: 0,
        }
    }

    fn push(&mut self, value: i64) {
        if self.separator_seen {
            self.buf.push_str(self.delimiter);
        }
        self.separator_seen = true;
        self.buf.push_str(&value.to_string());
        self.count += 1;
    }
}

/// One side of a two-party merge.
///
/// The worker holds its run in memory and everything else behind its
/// [`WorkerEnv`]. It keeps no protocol state between calls: each step
/// reloads [`PersistedState`] from the state store, so a worker rebuilt from
/// the same run and store continues exactly where the previous instance
/// stopped.
pub struct MergeWorker {
    id: WorkerId,
    run: Vec<i64>,
    env: WorkerEnv,
    config: WorkerConfig,
    stats: WorkerStats,
}

impl MergeWorker {
    /// Create a worker over a non-decreasing `run`.
    pub fn new(
        id: WorkerId,
        run: Vec<i64>,
        env: WorkerEnv,
        config: WorkerConfig,
    ) -> WorkerResult<Self> {
        config.validate()?;
        if let Some(index) = run.windows(2).position(|w| w[0] > w[1]) {
            return Err(WorkerError::UnsortedRun {
                worker: id,
                index: index + 1,
            });
        }
        Ok(Self {
            id,
            run,
            env,
            config,
            stats: WorkerStats::default(),
        })
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn run(&self) -> &[i64] {
        &self.run
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Counters accumulated by this instance. Not persisted.
    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// Load and validate the persisted state, or the initial state if none
    /// was saved yet.
    pub fn state(&self) -> WorkerResult<PersistedState> {
        let state = self
            .env
            .states
            .load(self.id)?
            .unwrap_or_else(|| PersistedState::initial(self.run.len()));

        if state.run_length != self.run.len() {
            return Err(WorkerError::RunLengthMismatch {
                worker: self.id,
                persisted: state.run_length,
                actual: self.run.len(),
            });
        }
        if !state.cursors_valid() {
            return Err(self.corrupt(format!(
                "cursors out of range: announce={} emit={} len={}",
                state.announce_cursor, state.emit_cursor, state.run_length
            )));
        }
        match state.phase {
            Phase::Unlocked => Err(self.corrupt("unlocked is never persisted".into())),
            Phase::Finished if !state.is_exhausted() => Err(self.corrupt(format!(
                "finished with {} values outstanding",
                state.remaining()
            ))),
            _ => Ok(state),
        }
    }

    /// Execute one bounded unit of work.
    ///
    /// | phase          | inbound   | action                   |
    /// |----------------|-----------|--------------------------|
    /// | `Finished`     | not read  | `Done`                   |
    /// | `Init`         | none      | first move               |
    /// | `Init`         | `Chunk`   | steady state             |
    /// | `Init`         | `Final`   | peer finished            |
    /// | `AwaitingPeer` | none      | `Pending`, no effects    |
    /// | `AwaitingPeer` | `Chunk`   | unlock, steady state     |
    /// | `AwaitingPeer` | `Final`   | unlock, peer finished    |
    ///
    /// Output is appended first, then state is saved, then the outgoing
    /// message is written.
    pub fn step(&mut self) -> WorkerResult<StepOutcome> {
        let mut state = self.state()?;
        if state.phase == Phase::Finished {
            return Ok(StepOutcome::Done);
        }

        let inbound = self.env.transport.read(&self.env.inbox)?;
        if let Some(msg) = &inbound {
            self.stats.messages_received += 1;
            self.check_inbound(msg, &state)?;
        }

        if state.phase == Phase::AwaitingPeer {
            if inbound.is_none() {
                return Ok(StepOutcome::Pending);
            }
            state.phase = Phase::Unlocked;
        }

        let before = state.phase;
        let delimiter = self.config.delimiter.clone();
        let mut emission = Emission::new(
            inbound.as_ref().is_some_and(|m| m.separator_seen),
            &delimiter,
        );

        let outgoing = match &inbound {
            None => self.announce(&mut state, emission.separator_seen),
            Some(msg) if msg.is_final() => {
                self.drain(&mut state, &mut emission, &msg.checkpoints);
                self.flush(&mut state, &mut emission);
                state.phase = Phase::Finished;
                Message::ack(emission.separator_seen)
            }
            Some(msg) => {
                self.drain(&mut state, &mut emission, &msg.checkpoints);
                self.announce(&mut state, emission.separator_seen)
            }
        };

        if emission.count > 0 {
            self.env.sink.append(emission.buf.as_bytes())?;
            self.stats.values_emitted += emission.count;
        }
        self.env.states.save(self.id, &state)?;
        self.env.transport.write(&self.env.outbox, &outgoing)?;
        self.stats.messages_sent += 1;

        debug!(
            worker = %self.id,
            from = %before,
            to = %state.phase,
            emitted = emission.count,
            sent = %outgoing.tag,
            checkpoints = outgoing.checkpoints.len(),
            "step"
        );

        if state.phase.is_terminal() {
            Ok(StepOutcome::Done)
        } else {
            Ok(StepOutcome::Pending)
        }
    }

    fn check_inbound(&self, msg: &Message, state: &PersistedState) -> WorkerResult<()> {
        if msg.checkpoints.len() > self.config.chunk_size {
            return Err(self.violation(format!(
                "{} checkpoints exceed chunk size {}",
                msg.checkpoints.len(),
                self.config.chunk_size
            )));
        }
        if !msg.is_ordered() {
            return Err(self.violation("checkpoints are not in ascending order".into()));
        }
        // The peer has already placed everything up to our last announced
        // value, so nothing it sends now may sort before it.
        let floor = self.announced_floor(state);
        if let (Some(floor), Some(&first)) = (floor, msg.checkpoints.first()) {
            if first < floor {
                return Err(self.violation(format!(
                    "checkpoint {first} precedes already announced value {floor}"
                )));
            }
        }
        Ok(())
    }

    /// Last own value handed to the peer, if any.
    fn announced_floor(&self, state: &PersistedState) -> Option<i64> {
        state
            .announce_cursor
            .checked_sub(1)
            .and_then(|i| self.run.get(i))
            .copied()
    }

    /// Write own values strictly below `boundary`, then `boundary` itself
    /// when `include` is set.
    fn emit_up_to(
        &mut self,
        state: &mut PersistedState,
        emission: &mut Emission<'_>,
        boundary: i64,
        include: bool,
    ) {
        while let Some(&value) = self.run.get(state.emit_cursor) {
            self.stats.comparisons += 1;
            if value >= boundary {
                break;
            }
            emission.push(value);
            state.emit_cursor += 1;
        }
        if include {
            emission.push(boundary);
        }
    }

    /// Place every peer checkpoint at its sorted position.
    fn drain(
        &mut self,
        state: &mut PersistedState,
        emission: &mut Emission<'_>,
        checkpoints: &[i64],
    ) {
        for &checkpoint in checkpoints {
            self.emit_up_to(state, emission, checkpoint, true);
        }
    }

    /// Write the rest of the own run. Only valid once the peer has nothing
    /// left to announce.
    fn flush(&self, state: &mut PersistedState, emission: &mut Emission<'_>) {
        for &value in &self.run[state.emit_cursor..] {
            emission.push(value);
        }
        state.emit_cursor = self.run.len();
    }

    /// Hand the next slice of the own run to the peer.
    fn announce(&self, state: &mut PersistedState, separator_seen: bool) -> Message {
        let start = state.emit_cursor;
        let end = start.saturating_add(self.config.chunk_size).min(self.run.len());
        let checkpoints = self.run[start..end].to_vec();
        state.emit_cursor = end;
        state.announce_cursor = end;

        if state.is_exhausted() {
            state.phase = Phase::Finished;
            Message::final_with(checkpoints, separator_seen)
        } else {
            state.phase = Phase::AwaitingPeer;
            Message::chunk(checkpoints, separator_seen)
        }
    }

    fn corrupt(&self, reason: String) -> WorkerError {
        WorkerError::CorruptState {
            worker: self.id,
            reason,
        }
    }

    fn violation(&self, reason: String) -> WorkerError {
        WorkerError::ProtocolViolation {
            worker: self.id,
            reason,
        }
    }
}

impl std::fmt::Debug for MergeWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeWorker")
            .field("id", &self.id)
            .field("run_length", &self.run.len())
            .field("env", &self.env)
            .field("stats", &self.stats)
            .finish()
    }
}
