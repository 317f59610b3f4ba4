use anyhow::{bail, Context};
use colored::Colorize;

use pairmerge_coordinator::{JobDir, MergeReport};
use pairmerge_types::{WorkerId, WorkerStats};
use pairmerge_worker::{MergeWorker, StepOutcome};

use crate::cli::*;
use crate::config::JobConfig;
use crate::input::read_run;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args, cli.format),
        Command::Step(args) => cmd_step(args, cli.format),
        Command::Verify(args) => cmd_verify(args, cli.format),
    }
}

fn cmd_run(args: RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = JobConfig::resolve(&args.job, args.max_steps)?;
    let run_a = read_run(&args.input_a)?;
    let run_b = read_run(&args.input_b)?;
    let report = run_job(&JobDir::new(&args.job.work_dir), run_a, run_b, &config, args.resume)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    if !report.success {
        bail!("step budget of {} exhausted before both workers finished", config.max_steps);
    }
    Ok(())
}

/// Run a job in `dir`, from scratch unless `resume` is set.
pub fn run_job(
    dir: &JobDir,
    run_a: Vec<i64>,
    run_b: Vec<i64>,
    config: &JobConfig,
    resume: bool,
) -> anyhow::Result<MergeReport> {
    if !resume {
        dir.reset().with_context(|| format!("resetting {}", dir.root().display()))?;
    }
    let mut job = dir.job(run_a, run_b, config.worker_config())?;
    Ok(job.run(config.max_steps)?)
}

fn cmd_step(args: StepArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = JobConfig::resolve(&args.job, None)?;
    let run = read_run(&args.input)?;
    let dir = JobDir::new(&args.job.work_dir);
    let env = dir.env(args.worker)?;
    let mut worker = MergeWorker::new(args.worker, run, env, config.worker_config())?;

    let outcome = worker.step()?;
    let state = worker.state()?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "worker": args.worker.to_string(),
                "more_work": outcome.more_work(),
                "state": state,
                "stats": worker.stats(),
            })
        ),
        OutputFormat::Text => {
            let status = match outcome {
                StepOutcome::Pending => "pending".yellow(),
                StepOutcome::Done => "done".green().bold(),
            };
            println!("Worker {} stepped: {}", args.worker.to_string().bold(), status);
            println!("  Phase: {}", state.phase.to_string().cyan());
            println!("  Cursor: {}/{}", state.emit_cursor, state.run_length);
        }
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = JobConfig::resolve(&args.job, None)?;
    let dir = JobDir::new(&args.job.work_dir);
    let mut expected = read_run(&args.input_a)?;
    expected.extend(read_run(&args.input_b)?);
    expected.sort();
    let actual = dir.read_output(&config.delimiter)?;
    let mismatch = first_mismatch(&expected, &actual);

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "valid": mismatch.is_none(),
                "expected_len": expected.len(),
                "actual_len": actual.len(),
                "first_mismatch": mismatch,
            })
        ),
        OutputFormat::Text => match mismatch {
            None => println!(
                "{} Output is the sorted merge of both inputs ({} values)",
                "✓".green().bold(),
                actual.len()
            ),
            Some(index) => println!(
                "{} Output diverges at index {} (expected {} values, found {})",
                "✗".red().bold(),
                index,
                expected.len(),
                actual.len()
            ),
        },
    }
    if let Some(index) = mismatch {
        bail!("output diverges from the sorted merge at index {index}");
    }
    Ok(())
}

/// Index of the first position where the two sequences differ, if any.
fn first_mismatch(expected: &[i64], actual: &[i64]) -> Option<usize> {
    match expected.iter().zip(actual).position(|(e, a)| e != a) {
        Some(index) => Some(index),
        None if expected.len() != actual.len() => Some(expected.len().min(actual.len())),
        None => None,
    }
}

fn print_report(report: &MergeReport) {
    if report.success {
        println!("{} Merge complete in {} steps", "✓".green().bold(), report.total_steps);
    } else {
        println!("{} Merge incomplete after {} steps", "✗".red().bold(), report.total_steps);
    }
    print_stats(WorkerId::A, &report.stats_a);
    print_stats(WorkerId::B, &report.stats_b);
}

fn print_stats(id: WorkerId, stats: &WorkerStats) {
    println!(
        "  {}: {} emitted, {} sent, {} received, {} comparisons",
        id.to_string().bold(),
        stats.values_emitted,
        stats.messages_sent,
        stats.messages_received,
        stats.comparisons
    );
}
