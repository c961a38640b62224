use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;
use vtpcheck_core::{TemplateFingerprint, Verdict, VtpError, check_letter};
use vtpcheck_pdf_mupdf::MupdfBackend;

/// Exit status when the letter fails its validity checks.
const EXIT_REJECTED: u8 = 1;
/// Exit status when the PDF cannot be loaded at all.
const EXIT_LOAD_ERROR: u8 = 2;

/// VTP Letter Checker - Validate travel-approval letters and extract their fields
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a VTP letter PDF and extract its fields
    Check {
        /// Path to the letter PDF
        file_path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Print the result object as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Path to output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to an alternate template fingerprint (TOML)
        #[arg(long)]
        template: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            file_path,
            no_color,
            json,
            output,
            template,
        } => check(file_path, no_color, json, output, template),
    }
}

fn check(
    file_path: PathBuf,
    no_color: bool,
    json: bool,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let fingerprint = match template {
        Some(path) => TemplateFingerprint::from_toml_file(&path)?,
        None => TemplateFingerprint::default(),
    };

    // Color only applies to the human-readable table on a terminal.
    let use_color = !no_color && !json && output.is_none();
    let color = ColorMode(use_color);

    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };

    let result = check_letter(&file_path, &MupdfBackend::new(), &fingerprint);
    let status = exit_status(&result);

    let pdf_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.display().to_string());

    match &result {
        Ok(verdict) => {
            if json {
                serde_json::to_writer_pretty(&mut writer, verdict)?;
                writeln!(writer)?;
            } else {
                match verdict {
                    Verdict::Fields(report) => {
                        output::print_report(&mut writer, &pdf_name, report, color)?
                    }
                    Verdict::Rejected(_) => output::print_rejection(&mut writer, &pdf_name, color)?,
                }
            }
        }
        Err(err) => eprintln!("Error: {err}"),
    }
    writer.flush()?;

    Ok(ExitCode::from(status))
}

/// Exit status contract: 0 for a valid letter, [`EXIT_REJECTED`] when the
/// validity checks fail, [`EXIT_LOAD_ERROR`] when the PDF cannot be loaded,
/// so callers can tell an unreadable file from a rejected letter.
fn exit_status(result: &Result<Verdict, VtpError>) -> u8 {
    match result {
        Ok(verdict) if verdict.is_rejected() => EXIT_REJECTED,
        Ok(_) => 0,
        Err(_) => EXIT_LOAD_ERROR,
    }
}
