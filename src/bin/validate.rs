//! `cmdref validate`
//!
//! Loads a data directory, builds the index once and prints what it found.
//! Exits non-zero if any data file is missing, malformed or collides on a
//! command name.
//!
//!   cargo run --bin validate -- --data-dir data

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use cmdref::constants::DEFAULT_DATA_DIR;
use cmdref::index::Index;
use cmdref::loader::Loader;
use cmdref::logging::init_logging;
use cmdref::model::RiskLevel;

#[derive(Parser)]
#[command(name = "validate", about = "Check a command-reference data directory")]
struct Args {
    /// Data directory containing metadata.yaml
    #[arg(short, long, env = "CMDREF_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging("warn");
    let args = Args::parse();

    println!("[1/3] Loading '{}'…", args.data_dir.display());
    let dataset = Loader::new(&args.data_dir)
        .load_all()
        .await
        .with_context(|| format!("loading {}", args.data_dir.display()))?;
    println!(
        "      version {}  |  {} data files  |  {} commands",
        dataset.metadata.version,
        dataset.metadata.data_files.len(),
        dataset.commands.len()
    );

    let declared_categories = dataset.metadata.categories.len();
    let critical = dataset
        .commands
        .iter()
        .filter(|c| c.highest_risk() == RiskLevel::Critical)
        .count();

    println!("[2/3] Building index…");
    let index = Index::new();
    index.build(dataset.commands).context("building index")?;
    let snapshot = index.snapshot();
    println!(
        "      {} categories  |  {} platforms  |  {} keywords",
        snapshot.category_index.len(),
        snapshot.platform_index.len(),
        snapshot.keyword_index.len()
    );

    println!("[3/3] Summary");
    println!("      {declared_categories} categories declared in the manifest");
    println!("      {critical} commands carry a critical risk");
    println!("Done.  Run `cargo run --bin cmdref -- search <query>` to search.");
    Ok(())
}
