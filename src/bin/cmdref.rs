//! `cmdref`
//!
//! Loads the command reference once, then answers queries.
//!
//! Usage (single query):
//!   cargo run --bin cmdref -- search "copy file"
//!
//! Usage (interactive REPL):
//!   cargo run --bin cmdref -- search
//!
//! Other views:
//!   cargo run --bin cmdref -- show ls
//!   cargo run --bin cmdref -- list "OS/Linux"
//!   cargo run --bin cmdref -- export --format markdown commands.md

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};

use cmdref::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_DATA_DIR, DEFAULT_TOP_K};
use cmdref::export;
use cmdref::logging::init_logging;
use cmdref::model::{Command, RiskLevel};
use cmdref::search::search_and_print;
use cmdref::{CommandService, ServiceConfig};

#[derive(Parser)]
#[command(name = "cmdref", version, about = "Command-line reference for operators and developers")]
struct Cli {
    /// Data directory containing metadata.yaml
    #[arg(short, long, global = true, env = "CMDREF_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Number of distinct queries kept in the search cache
    #[arg(long, global = true, default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List commands, optionally restricted to one category
    List { category: Option<String> },
    /// Show every detail of one command
    Show { name: String },
    /// Ranked search; starts a prompt when no query is given
    Search {
        query: Vec<String>,
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// List categories with their command counts
    Categories,
    /// List commands available on a platform
    Platform { platform: String },
    /// List commands by highest risk level (high and critical by default)
    Risk { level: Option<RiskLevel> },
    /// Export every command
    Export {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
        output: PathBuf,
    },
    /// Print version and dataset information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    JsonCompact,
    Markdown,
}

fn print_listing(title: &str, commands: &[Arc<Command>]) {
    if commands.is_empty() {
        println!("No commands found.");
        return;
    }
    println!("\n{title} ({} commands)", commands.len());
    println!("{}", "=".repeat(80));
    for cmd in commands {
        let install = if cmd.install_required { "[install]" } else { "" };
        println!(
            "{:<20} {} {} {}",
            cmd.name,
            cmd.highest_risk().indicator(),
            install,
            cmd.description
        );
    }
    println!("\nUse 'cmdref show <name>' for details.");
}

fn print_detail(cmd: &Command) {
    println!("\nCommand: {}", cmd.name);
    println!("{}", "=".repeat(80));
    println!("\nDescription:\n  {}", cmd.description);
    println!("\nCategory: {}", cmd.category);
    println!("Platforms: {}", cmd.platforms.join(", "));

    if cmd.install_required {
        println!("\nInstall:\n  {}", cmd.install_method);
    }

    println!("\nUsage:");
    for usage in &cmd.usage {
        println!("  {usage}");
    }

    if !cmd.options.is_empty() {
        println!("\nOptions:");
        for opt in &cmd.options {
            println!("  {:<20} {}", opt.flag, opt.description);
        }
    }

    for (i, ex) in cmd.examples.iter().enumerate() {
        if i == 0 {
            println!("\nExamples:");
        }
        println!("\n  {}. {}", i + 1, ex.description);
        println!("  $ {}", ex.command);
        if !ex.output.is_empty() {
            println!("  Output: {}", ex.output);
        }
    }

    if !cmd.notes.is_empty() {
        println!("\nNotes:");
        for note in &cmd.notes {
            println!("  • {note}");
        }
    }

    if !cmd.risks.is_empty() {
        println!("\nRisks:");
        for risk in &cmd.risks {
            println!("  {} [{}] {}", risk.level.indicator(), risk.level, risk.description);
        }
    }

    if !cmd.related_commands.is_empty() {
        println!("\nRelated: {}", cmd.related_commands.join(", "));
    }

    if !cmd.references.is_empty() {
        println!("\nReferences:");
        for reference in &cmd.references {
            println!("  {reference}");
        }
    }
    println!();
}

fn repl(service: &CommandService, top_k: usize) -> io::Result<()> {
    println!("Type a query and press Enter. Ctrl-D / empty line to exit.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        let query = line.trim();
        search_and_print(query, &service.search(query), top_k)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging("warn");
    let cli = Cli::parse();

    let config = ServiceConfig {
        data_dir: cli.data_dir,
        cache_capacity: cli.cache_capacity,
    };
    let service = CommandService::open(&config).await.with_context(|| {
        format!(
            "failed to load command data from '{}'",
            config.data_dir.display()
        )
    })?;

    match cli.command {
        Cmd::List { category: None } => print_listing("All commands", &service.all_commands()),
        Cmd::List {
            category: Some(category),
        } => print_listing(
            &format!("Category: {category}"),
            &service.by_category(&category),
        ),
        Cmd::Show { name } => {
            let Ok(cmd) = service.command(&name) else {
                bail!("command '{name}' not found");
            };
            print_detail(&cmd);
        }
        Cmd::Search { query, top_k } if query.is_empty() => repl(&service, top_k)?,
        Cmd::Search { query, top_k } => {
            let query = query.join(" ");
            search_and_print(&query, &service.search(&query), top_k)?;
        }
        Cmd::Categories => {
            let categories = service.categories();
            println!("\nCategories ({})", categories.len());
            println!("{}", "=".repeat(80));
            for category in &categories {
                println!(
                    "{:<40} ({} commands)",
                    category,
                    service.by_category(category).len()
                );
            }
        }
        Cmd::Platform { platform } => print_listing(
            &format!("Platform: {platform}"),
            &service.by_platform(&platform),
        ),
        Cmd::Risk { level: Some(level) } => print_listing(
            &format!("Risk: {level}"),
            &service.filter_by_risk(level),
        ),
        Cmd::Risk { level: None } => {
            print_listing("High-risk commands", &service.high_risk_commands())
        }
        Cmd::Export { format, output } => {
            let commands = service.all_commands();
            match format {
                Format::Json => export::write_json(&commands, &output)?,
                Format::JsonCompact => export::write_json_compact(&commands, &output)?,
                Format::Markdown => export::write_markdown(&commands, &output)?,
            }
            println!("Exported {} commands to {}", commands.len(), output.display());
        }
        Cmd::Version => {
            println!("cmdref version {}", env!("CARGO_PKG_VERSION"));
            if let Some(meta) = service.metadata() {
                println!("Data version: {}", meta.version);
                println!("Data updated: {}", meta.updated_at);
            }
            println!("Total commands: {}", service.command_count());
            println!("Total categories: {}", service.category_count());
        }
    }

    Ok(())
}
