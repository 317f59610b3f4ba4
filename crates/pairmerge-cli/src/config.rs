use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use pairmerge_coordinator::DEFAULT_MAX_STEPS;
use pairmerge_worker::WorkerConfig;

use crate::cli::JobArgs;

/// Job parameters, read from an optional TOML file and overridden by flags.
///
/// ```toml
/// chunk_size = 11
/// max_steps = 10000
/// delimiter = ", "
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub chunk_size: usize,
    pub max_steps: usize,
    pub delimiter: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        let worker = WorkerConfig::default();
        Self {
            chunk_size: worker.chunk_size,
            max_steps: DEFAULT_MAX_STEPS,
            delimiter: worker.delimiter,
        }
    }
}

impl JobConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid job config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Config file (if any) with command-line overrides applied.
    pub fn resolve(args: &JobArgs, max_steps: Option<usize>) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(chunk_size) = args.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(max_steps) = max_steps {
            config.max_steps = max_steps;
        }
        config.worker_config().validate()?;
        Ok(config)
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            chunk_size: self.chunk_size,
            delimiter: self.delimiter.clone(),
        }
    }
}
