use crate::errors::Result;
use crate::planner::Plan;
use crate::transaction::{AppliedRename, RenameKind, RenameTransaction};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// How many leading and trailing lines an abbreviated listing keeps.
const HEAD_LINES: usize = 10;
const TAIL_LINES: usize = 5;

/// Defines the possible output formats for plans and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewFormat {
    /// A simple, human-readable text format.
    #[default]
    Text,
    /// JSON format, suitable for machine processing.
    Json,
    /// Comma-Separated Values format.
    Csv,
}

impl From<&str> for PreviewFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => PreviewFormat::Json,
            "csv" => PreviewFormat::Csv,
            _ => PreviewFormat::Text,
        }
    }
}

/// Renders folder listings, plans, and applied transactions.
pub struct PreviewFormatter {
    format: PreviewFormat,
    limit: usize,
    tool_name: String,
    tool_version: String,
}

impl PreviewFormatter {
    /// Creates a new `PreviewFormatter`.
    ///
    /// # Arguments
    ///
    /// * `format` - The `PreviewFormat` to use.
    /// * `limit` - Text listings with at least this many lines are abbreviated to
    ///   their first and last few lines. Structured formats are never abbreviated.
    pub fn new(format: PreviewFormat, limit: usize) -> Self {
        Self {
            format,
            limit,
            tool_name: "seqren".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Writes the names of the files found in the target folder.
    pub fn write_listing<W: Write>(&self, writer: &mut W, folder: &Path, files: &[PathBuf]) -> Result<()> {
        writeln!(writer, "Found {} files in {}.", files.len(), folder.display())?;
        let names: Vec<String> = files.iter().map(|f| file_name(f)).collect();
        for line in abbreviate(&names, self.limit) {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Writes the proposed renames and the skipped files of a plan.
    pub fn write_plan<W: Write>(&self, writer: &mut W, plan: &Plan) -> Result<()> {
        match self.format {
            PreviewFormat::Text => self.plan_text(writer, plan),
            PreviewFormat::Json => self.plan_json(writer, plan),
            PreviewFormat::Csv => self.plan_csv(writer, plan),
        }
    }

    /// Writes the renames a transaction performed.
    pub fn write_transaction<W: Write>(&self, writer: &mut W, tx: &RenameTransaction) -> Result<()> {
        match self.format {
            PreviewFormat::Text => {
                if let Some(folder) = tx.folder() {
                    writeln!(
                        writer,
                        "Folder renamed: {} -> {}",
                        file_name(&folder.from),
                        file_name(&folder.to)
                    )?;
                }
                writeln!(writer, "{} files have been renamed.", tx.file_count())?;
                let lines: Vec<String> = tx
                    .iter()
                    .filter(|r| r.kind == RenameKind::File)
                    .map(format_rename)
                    .collect();
                for line in abbreviate(&lines, self.limit) {
                    writeln!(writer, "{line}")?;
                }
            }
            PreviewFormat::Json => {
                #[derive(Serialize)]
                struct JsonTransaction<'a> {
                    tool: &'a str,
                    version: &'a str,
                    applied: Vec<&'a AppliedRename>,
                }
                let out = JsonTransaction {
                    tool: &self.tool_name,
                    version: &self.tool_version,
                    applied: tx.iter().collect(),
                };
                serde_json::to_writer_pretty(&mut *writer, &out)?;
                writeln!(writer)?;
            }
            PreviewFormat::Csv => {
                let mut csv_writer = csv::Writer::from_writer(&mut *writer);
                csv_writer.write_record(["kind", "from", "to"])?;
                for rename in tx.iter() {
                    csv_writer.write_record([
                        rename.kind.to_string(),
                        rename.from.display().to_string(),
                        rename.to.display().to_string(),
                    ])?;
                }
                csv_writer.flush()?;
            }
        }
        Ok(())
    }

    fn plan_text<W: Write>(&self, writer: &mut W, plan: &Plan) -> Result<()> {
        let lines: Vec<String> = plan
            .entries
            .iter()
            .map(|e| format!("{} -> {}", file_name(&e.original_path), file_name(&e.proposed_path)))
            .collect();
        writeln!(writer, "{} files will be renamed:", lines.len())?;
        for line in abbreviate(&lines, self.limit) {
            writeln!(writer, "{line}")?;
        }

        if !plan.skipped.is_empty() {
            writeln!(writer, "\n{} files skipped:", plan.skipped.len())?;
            let skipped: Vec<String> = plan
                .skipped
                .iter()
                .map(|s| format!("{} ({})", s.file_name, s.reason))
                .collect();
            for line in abbreviate(&skipped, self.limit) {
                writeln!(writer, "{line}")?;
            }
        }
        writeln!(writer)?;
        Ok(())
    }

    fn plan_json<W: Write>(&self, writer: &mut W, plan: &Plan) -> Result<()> {
        #[derive(Serialize)]
        struct JsonPlan<'a> {
            tool: &'a str,
            version: &'a str,
            #[serde(flatten)]
            plan: &'a Plan,
        }

        let out = JsonPlan {
            tool: &self.tool_name,
            version: &self.tool_version,
            plan,
        };
        serde_json::to_writer_pretty(&mut *writer, &out)?;
        writeln!(writer)?;
        Ok(())
    }

    fn plan_csv<W: Write>(&self, writer: &mut W, plan: &Plan) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(&mut *writer);
        csv_writer.write_record(["original", "proposed", "token", "skipped"])?;
        for entry in &plan.entries {
            csv_writer.write_record([
                file_name(&entry.original_path),
                file_name(&entry.proposed_path),
                entry.extracted_token.clone(),
                String::new(),
            ])?;
        }
        for skipped in &plan.skipped {
            csv_writer.write_record([
                skipped.file_name.clone(),
                String::new(),
                String::new(),
                skipped.reason.to_string(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_rename(rename: &AppliedRename) -> String {
    format!("{} -> {}", file_name(&rename.from), file_name(&rename.to))
}

/// Keeps every line below `limit`; otherwise the head, an ellipsis, and the tail.
fn abbreviate(lines: &[String], limit: usize) -> Vec<&str> {
    if lines.len() < limit || lines.len() <= HEAD_LINES + TAIL_LINES {
        return lines.iter().map(String::as_str).collect();
    }
    let mut out: Vec<&str> = lines[..HEAD_LINES].iter().map(String::as_str).collect();
    out.push("...");
    out.extend(lines[lines.len() - TAIL_LINES..].iter().map(String::as_str));
    out
}
