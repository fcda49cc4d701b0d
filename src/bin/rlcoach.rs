//! rlcoach CLI: ingest validation, full analysis, and the JSON+Markdown
//! dossier pair. Exit codes: 0 success, 2 invalid arguments (clap), 3 ingest
//! or header failure, 4 schema validation breach (an engine bug).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use rlcoach::adapter::AdapterKind;
use rlcoach::pipeline::{analyze_file, render_validated, PipelineOptions};
use rlcoach::report::{write_atomic, Report};

#[derive(Parser)]
#[command(name = "rlcoach")]
#[command(about = "Offline Rocket League replay analysis", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a replay file without analyzing it.
    Ingest {
        path: PathBuf,
        /// Emit the ingest report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run the full pipeline and emit the JSON report.
    Analyze {
        path: PathBuf,
        /// Parser backend: `rust` (native) or `null` (header-only).
        #[arg(long, default_value = "rust")]
        adapter: String,
        /// Write the report under this directory instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,
    },
    /// Emit both the JSON report and the Markdown dossier.
    ReportMd {
        path: PathBuf,
        #[arg(long, default_value = "out")]
        out: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}

const EXIT_INGEST: u8 = 3;
const EXIT_ENGINE_BUG: u8 = 4;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("rlcoach: {err:#}");
            ExitCode::from(EXIT_ENGINE_BUG)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Ingest { path, json } => ingest_command(&path, json),
        Command::Analyze {
            path,
            adapter,
            out,
            pretty,
        } => {
            let adapter = match AdapterKind::from_name(&adapter) {
                Ok(kind) => kind,
                Err(err) => {
                    eprintln!("rlcoach: {err}");
                    return Ok(ExitCode::from(2));
                }
            };
            let report = run_pipeline(&path, adapter);
            let json = render_validated(&report, pretty)?;
            match out {
                Some(dir) => {
                    let dest = dir.join(output_name(&path, "json"));
                    write_atomic(&dest, &json)?;
                    println!("{}", dest.display());
                }
                None => println!("{json}"),
            }
            Ok(exit_for(&report))
        }
        Command::ReportMd { path, out, pretty } => {
            let report = run_pipeline(&path, AdapterKind::Native);
            let json = render_validated(&report, pretty)?;
            let markdown = rlcoach::markdown::render(&report);

            let json_dest = out.join(output_name(&path, "json"));
            let md_dest = out.join(output_name(&path, "md"));
            write_atomic(&json_dest, &json)?;
            write_atomic(&md_dest, &markdown)?;
            println!("{}", json_dest.display());
            println!("{}", md_dest.display());
            Ok(exit_for(&report))
        }
    }
}

fn run_pipeline(path: &Path, adapter: AdapterKind) -> Report {
    let options = PipelineOptions {
        adapter,
        generated_at: chrono::Utc::now(),
    };
    analyze_file(path, &options)
}

fn ingest_command(path: &Path, json: bool) -> Result<ExitCode> {
    match rlcoach::ingest::validate(path) {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{}: {} bytes, sha256 {}, format {}",
                    path.display(),
                    report.size_bytes,
                    report.sha256,
                    report.format_hint
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!(
                "{}",
                serde_json::json!({
                    "error": "unreadable_replay_file",
                    "details": err.envelope_details(),
                })
            );
            Ok(ExitCode::from(EXIT_INGEST))
        }
    }
}

fn exit_for(report: &Report) -> ExitCode {
    if report.is_error() {
        ExitCode::from(EXIT_INGEST)
    } else {
        ExitCode::SUCCESS
    }
}

fn output_name(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "replay".to_string());
    PathBuf::from(format!("{stem}.{extension}"))
}
