use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pairmerge",
    about = "Two-party merge of sorted integer runs over single-slot mailboxes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a merge job to completion
    Run(RunArgs),
    /// Perform a single step of one worker from its persisted state
    Step(StepArgs),
    /// Check the job output against the sorted merge of both inputs
    Verify(VerifyArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct JobArgs {
    /// Job directory holding mailbox slots, worker state, and output
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,
    /// TOML job configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Maximum checkpoints per message (overrides the config file)
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Sorted input run for worker A
    #[arg(long = "a")]
    pub input_a: PathBuf,
    /// Sorted input run for worker B
    #[arg(long = "b")]
    pub input_b: PathBuf,
    #[command(flatten)]
    pub job: JobArgs,
    /// Step budget (overrides the config file)
    #[arg(long)]
    pub max_steps: Option<usize>,
    /// Continue from the state already in the job directory
    #[arg(long)]
    pub resume: bool,
}

#[derive(Args)]
pub struct StepArgs {
    /// Worker to step (a or b)
    #[arg(long)]
    pub worker: pairmerge_types::WorkerId,
    /// The worker's sorted input run
    #[arg(long)]
    pub input: PathBuf,
    #[command(flatten)]
    pub job: JobArgs,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(long = "a")]
    pub input_a: PathBuf,
    #[arg(long = "b")]
    pub input_b: PathBuf,
    #[command(flatten)]
    pub job: JobArgs,
}
