use std::io::Write;

use owo_colors::OwoColorize;
use vtpcheck_core::{FieldReport, REJECTION_MESSAGE};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the extracted field map as an aligned two-column table.
pub fn print_report(
    w: &mut dyn Write,
    pdf_name: &str,
    report: &FieldReport,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "Valid VTP letter:".green().bold(), pdf_name)?;
    } else {
        writeln!(w, "Valid VTP letter: {}", pdf_name)?;
    }
    writeln!(w)?;

    let entries = report.entries();
    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in entries {
        if value.is_empty() {
            if color.enabled() {
                writeln!(w, "{:>width$}  {}", key, "(not found)".dimmed())?;
            } else {
                writeln!(w, "{:>width$}  (not found)", key)?;
            }
        } else {
            writeln!(w, "{:>width$}  {}", key, value)?;
        }
    }
    Ok(())
}

/// Print the opaque rejection result.
pub fn print_rejection(w: &mut dyn Write, pdf_name: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", format!("{REJECTION_MESSAGE}:").red().bold(), pdf_name)?;
    } else {
        writeln!(w, "{REJECTION_MESSAGE}: {}", pdf_name)?;
    }
    Ok(())
}
