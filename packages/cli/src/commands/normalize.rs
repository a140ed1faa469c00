use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_editor::{Change, Schema};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Value to normalize (JSON)
    pub value: PathBuf,

    /// Print only the repaired value
    #[arg(short, long)]
    pub quiet: bool,
}

/// Print the normalized value and the operations that repaired it.
pub fn normalize(args: NormalizeArgs, config: &Config) -> Result<()> {
    let value = super::read_value(&args.value)?;
    let schema = Schema::new().with_max_iterations(config.editor.max_normalize_iterations);

    let mut change = Change::with_schema(value, Arc::new(schema));
    change.normalize()?;
    let commit = change.commit()?;

    if commit.batch.is_empty() {
        eprintln!("{} Already normalized", "✓".green());
    } else {
        eprintln!(
            "{} {} repairs",
            "⚠️".yellow(),
            commit.batch.len()
        );
    }

    let value = commit.value.to_json(&config.editor.json_options())?;
    let output = if args.quiet {
        value
    } else {
        json!({ "value": value, "operations": commit.batch })
    };
    println!("{}", config.render(&output)?);
    Ok(())
}
