use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Starting value (JSON)
    pub value: PathBuf,

    /// Operation log to apply (JSON)
    pub operations: PathBuf,

    /// Keep node keys and the selection in the output
    #[arg(short, long)]
    pub keys: bool,
}

pub fn replay(args: ReplayArgs, config: &Config) -> Result<()> {
    let value = super::read_value(&args.value)?;
    let batch = super::read_batch(&args.operations)?;

    let result = batch.apply_to(&value)?;
    eprintln!(
        "{} Applied {} operations",
        "✓".green(),
        batch.len()
    );

    let mut options = config.editor.json_options();
    if args.keys {
        options.preserve_keys = true;
        options.preserve_selection = true;
    }
    println!("{}", config.render(&result.to_json(&options)?)?);
    Ok(())
}
