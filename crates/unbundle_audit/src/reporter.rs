use std::{
    collections::BTreeMap,
    io::{self, Write},
};

use colored::Colorize;
use log::debug;

use crate::types::{Finding, FindingKind};

pub fn print_no_findings_message<W: Write>(writer: &mut W) -> io::Result<()> {
    debug!("No unbundled libraries required");
    writeln!(writer, "{} No requires of unbundled libraries found.", "✓".green().bold())?;
    writer.flush()?;
    Ok(())
}

pub fn print_findings_tree<W: Write>(writer: &mut W, findings: &[Finding]) -> io::Result<()> {
    debug!("Printing findings tree for {} findings", findings.len());
    let mut by_file: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for f in findings {
        by_file.entry(f.file.as_str()).or_default().push(f);
    }

    writeln!(writer, "{} Unbundled libraries required\n", "⚠".yellow().bold())?;

    for (file, file_findings) in &by_file {
        writeln!(writer, "{}", file.bright_white().bold())?;
        for (idx, finding) in file_findings.iter().enumerate() {
            let is_last = idx == file_findings.len() - 1;
            let prefix = if is_last { "└──" } else { "├──" };
            let label = match finding.kind {
                FindingKind::Unbundled => finding.request.yellow(),
                FindingKind::Missing => finding.request.red(),
            };
            writeln!(
                writer,
                "{}  {}:{} require '{}'",
                prefix.dimmed(),
                file.blue(),
                finding.line,
                label
            )?;
            let pad = if is_last { "   " } else { "│  " };
            writeln!(writer, "{}  {}", pad.dimmed(), finding.message)?;
        }
        writeln!(writer)?;
    }

    print_summary(writer, findings)?;
    writer.flush()?;
    Ok(())
}

fn print_summary<W: Write>(writer: &mut W, findings: &[Finding]) -> io::Result<()> {
    let missing = findings.iter().filter(|f| f.kind == FindingKind::Missing).count();
    let unbundled = findings.len() - missing;

    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Unbundled requires: {}", unbundled.to_string().yellow().bold())?;
    writeln!(writer, "  Missing libraries: {}", missing.to_string().red().bold())?;
    Ok(())
}
