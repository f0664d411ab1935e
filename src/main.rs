use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use fruit_batch::{
    config::BatchConfig,
    core::{launcher::JobLauncher, repository::InMemoryJobRepository},
    fruit::launch_fruit_job,
};

/// Append fruit records from one CSV file to another, in chunks.
#[derive(Parser, Debug)]
#[command(name = "fruit-batch", version, about)]
struct Args {
    /// Headerless `name,price` input file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file, appended to and created when absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of records written per chunk
    #[arg(short, long)]
    chunk_size: Option<usize>,

    /// Name under which the run is recorded
    #[arg(long)]
    job_name: Option<String>,
}

impl Args {
    fn into_config(self) -> BatchConfig {
        let defaults = BatchConfig::default();
        BatchConfig {
            input_path: self.input.unwrap_or(defaults.input_path),
            output_path: self.output.unwrap_or(defaults.output_path),
            chunk_size: self.chunk_size.unwrap_or(defaults.chunk_size),
            job_name: self.job_name.unwrap_or(defaults.job_name),
            ..defaults
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();

    let repository = InMemoryJobRepository::new();
    let launcher = JobLauncher::new(&repository);

    let execution = launch_fruit_job(&config, &launcher)
        .with_context(|| format!("job {} failed", config.job_name))?;

    info!(
        "{} records appended to {} in {} chunks",
        execution.write_count(),
        config.output_path.display(),
        execution.commit_count()
    );

    Ok(())
}
