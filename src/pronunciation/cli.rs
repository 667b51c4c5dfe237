use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::Level;

#[derive(Parser, Debug)]
#[command(
    name = "pronunciation",
    version,
    about = "Score a learner recording against a native reference"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare one learner recording with a reference recording.
    Compare(CompareArgs),
    /// Score several learner takes against the same reference in parallel.
    Batch(BatchArgs),
    /// Print the extracted features of a recording as JSON.
    Analyze(AnalyzeArgs),
    /// Print basic facts about an audio file as JSON.
    Info(InfoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// JSON file overriding the default calibration and analysis settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Learner recording.
    #[arg(long, value_name = "PATH")]
    pub user: PathBuf,
    /// Native reference recording.
    #[arg(long, value_name = "PATH")]
    pub reference: PathBuf,
    /// Proficiency level: beginner, intermediate or advanced.
    #[arg(long, default_value = "beginner")]
    pub level: String,
    /// Emit the full comparison as JSON.
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Native reference recording.
    #[arg(long, value_name = "PATH")]
    pub reference: PathBuf,
    /// Learner recordings to score.
    #[arg(value_name = "USER", required = true)]
    pub takes: Vec<PathBuf>,
    #[arg(long, default_value = "beginner")]
    pub level: String,
    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

impl CompareArgs {
    pub fn level(&self) -> Level {
        Level::from_request(&self.level)
    }
}

impl BatchArgs {
    pub fn level(&self) -> Level {
        Level::from_request(&self.level)
    }
}
