//! pdfium-forms - export, validate and import PDF form data
//!
//! Logging goes through `env_logger`; set `RUST_LOG=pdfium_forms=debug` to
//! follow handle acquisition and release.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pdfium_forms::{codec, validate, FormEnvironment, FormSnapshot, Library, OpenOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "pdfium-forms",
    about = "Export, validate and import PDF form data",
    version
)]
struct Args {
    /// Password for encrypted documents
    #[arg(short, long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write every form field of a PDF as a JSON snapshot
    Export {
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Indent the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Check required fields and length limits of a PDF or a JSON snapshot
    Validate {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Fill a PDF from a JSON snapshot and save the result
    Import {
        #[arg(value_name = "PDF")]
        input: PathBuf,

        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,

        /// Where to write the filled PDF
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,
    },
}

fn open_options(password: Option<String>) -> OpenOptions {
    match password {
        Some(password) => OpenOptions::new().password(password),
        None => OpenOptions::new(),
    }
}

fn capture(library: &Library, input: &Path, options: &OpenOptions) -> Result<FormSnapshot> {
    let doc = library
        .open_path(input, options)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let form = FormEnvironment::open(&doc).context("Failed to initialize form environment")?;
    let snapshot = FormSnapshot::capture(&form)
        .with_context(|| format!("Failed to read form fields of {}", input.display()))?;
    Ok(snapshot)
}

fn read_snapshot(path: &Path) -> Result<FormSnapshot> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    codec::decode(&text).with_context(|| format!("Invalid snapshot {}", path.display()))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();
    let options = open_options(args.password);
    let library = Library::pdfium();

    match args.command {
        Commands::Export {
            input,
            output,
            pretty,
        } => {
            let snapshot = capture(&library, &input, &options)?;
            let text = if pretty {
                codec::encode_pretty(&snapshot)
            } else {
                codec::encode(&snapshot)
            };
            match output {
                Some(path) => fs::write(&path, text)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{text}"),
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { input } => {
            let snapshot = if is_json(&input) {
                read_snapshot(&input)?
            } else {
                capture(&library, &input, &options)?
            };
            let report = validate(&snapshot);
            for field in &report.field_errors {
                for error in &field.errors {
                    println!("{}: {}", field.name, error);
                }
            }
            if report.is_valid {
                println!("{} fields, no errors", snapshot.records().len());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("{} errors", report.error_count());
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Import {
            input,
            snapshot,
            output,
        } => {
            let snapshot = read_snapshot(&snapshot)?;
            let doc = library
                .open_path(&input, &options)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let complete = {
                let form = FormEnvironment::open(&doc).context("Failed to initialize form environment")?;
                snapshot.restore(&form).context("Failed to restore form data")?
            };
            if !complete {
                log::warn!("some fields could not be written");
            }
            doc.save_to_path(&output)
                .with_context(|| format!("Failed to save {}", output.display()))?;
            if !complete {
                bail!("{} saved, but some fields were rejected", output.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
