use crate::config::Config;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InvertArgs {
    /// Operation log to invert (JSON)
    pub operations: PathBuf,
}

/// Print the log that undoes `operations`.
pub fn invert(args: InvertArgs, config: &Config) -> Result<()> {
    let batch = super::read_batch(&args.operations)?;
    println!("{}", config.render(&batch.inverse())?);
    Ok(())
}
