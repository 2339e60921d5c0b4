use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::constants::EXPORT_FORMAT_VERSION;
use crate::error::ExportError;
use crate::model::Command;

#[derive(Serialize)]
struct JsonExport<'a> {
    version: &'a str,
    total: usize,
    commands: Vec<&'a Command>,
}

/// Pretty JSON document with a version header and count.
pub fn to_json(commands: &[Arc<Command>]) -> Result<String, ExportError> {
    let doc = JsonExport {
        version: EXPORT_FORMAT_VERSION,
        total: commands.len(),
        commands: commands.iter().map(|c| c.as_ref()).collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Bare JSON array of commands.
pub fn to_json_compact(commands: &[Arc<Command>]) -> Result<String, ExportError> {
    let list: Vec<&Command> = commands.iter().map(|c| c.as_ref()).collect();
    Ok(serde_json::to_string(&list)?)
}

/// Markdown reference grouped by category, categories in ascending order.
pub fn to_markdown(commands: &[Arc<Command>]) -> Result<String, ExportError> {
    let mut by_category: BTreeMap<&str, Vec<&Command>> = BTreeMap::new();
    for cmd in commands {
        by_category
            .entry(cmd.category.as_str())
            .or_default()
            .push(cmd.as_ref());
    }

    let mut out = String::new();
    writeln!(out, "# Command Reference\n")?;
    writeln!(out, "Total commands: {}\n", commands.len())?;
    writeln!(out, "---\n")?;

    for (category, cmds) in by_category {
        writeln!(out, "## {category}\n")?;
        for cmd in cmds {
            write_command(&mut out, cmd)?;
        }
    }
    Ok(out)
}

fn write_command(out: &mut String, cmd: &Command) -> fmt::Result {
    writeln!(out, "### {}\n", cmd.name)?;
    writeln!(out, "**Description**: {}\n", cmd.description)?;
    writeln!(out, "**Platforms**: {}\n", cmd.platforms.join(", "))?;

    if !cmd.usage.is_empty() {
        writeln!(out, "**Usage**:")?;
        for usage in &cmd.usage {
            writeln!(out, "```\n{usage}\n```")?;
        }
        out.push('\n');
    }

    if !cmd.options.is_empty() {
        writeln!(out, "**Options**:\n")?;
        for opt in &cmd.options {
            writeln!(out, "- `{}`: {}", opt.flag, opt.description)?;
        }
        out.push('\n');
    }

    if !cmd.examples.is_empty() {
        writeln!(out, "**Examples**:\n")?;
        for (i, ex) in cmd.examples.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, ex.description)?;
            writeln!(out, "   ```bash\n   {}\n   ```", ex.command)?;
            if !ex.output.is_empty() {
                writeln!(out, "   Output:\n   ```\n   {}\n   ```", ex.output)?;
            }
        }
        out.push('\n');
    }

    if !cmd.risks.is_empty() {
        writeln!(out, "**Risks**:\n")?;
        for risk in &cmd.risks {
            writeln!(
                out,
                "- {} **[{}]** {}",
                risk.level.indicator(),
                risk.level,
                risk.description
            )?;
        }
        out.push('\n');
    }

    if !cmd.install_method.is_empty() {
        writeln!(out, "**Install**: {}\n", cmd.install_method)?;
    }

    writeln!(out, "---\n")
}

pub fn write_json(commands: &[Arc<Command>], path: &Path) -> Result<(), ExportError> {
    fs::write(path, to_json(commands)?)?;
    Ok(())
}

pub fn write_json_compact(commands: &[Arc<Command>], path: &Path) -> Result<(), ExportError> {
    fs::write(path, to_json_compact(commands)?)?;
    Ok(())
}

pub fn write_markdown(commands: &[Arc<Command>], path: &Path) -> Result<(), ExportError> {
    fs::write(path, to_markdown(commands)?)?;
    Ok(())
}
