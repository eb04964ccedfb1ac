use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use roster_extract::export;
use roster_extract::parser::numerals::normalize_line;
use roster_extract::record::column_headers;
use roster_extract::{Extractor, Record, Settings};

#[derive(Parser)]
#[command(name = "roster_extract", about = "Turn OCR'd neighborhood roster forms into tabular records")]
struct Cli {
    /// Settings file (TOML); defaults to ./roster.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records from OCR text files
    Parse {
        /// OCR text files, one document each
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory for the generated files
        #[arg(short, long, default_value = "output")]
        out_dir: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Print CSV to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },
    /// Show blocks and the classification of each line
    Inspect { input: PathBuf },
    /// Print the output column header
    Columns,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
    Both,
}

impl Format {
    fn csv(self) -> bool {
        matches!(self, Format::Csv | Format::Both)
    }

    fn json(self) -> bool {
        matches!(self, Format::Json | Format::Both)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let t0 = Instant::now();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    let extractor = Extractor::new(settings)?;

    let result = match cli.command {
        Commands::Parse {
            inputs,
            out_dir,
            format,
            stdout,
        } => {
            if stdout {
                print_csv(&extractor, &inputs)
            } else {
                parse_files(&extractor, &inputs, &out_dir, format)
            }
        }
        Commands::Inspect { input } => inspect(&extractor, &input),
        Commands::Columns => {
            println!("{}", column_headers(extractor.settings()).join(" | "));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

struct FileResult {
    input: PathBuf,
    records: usize,
    written: Vec<PathBuf>,
}

fn parse_files(
    extractor: &Extractor,
    inputs: &[PathBuf],
    out_dir: &Path,
    format: Format,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let results: Vec<anyhow::Result<FileResult>> = inputs
        .par_iter()
        .map(|input| -> anyhow::Result<FileResult> {
            let text = read_input(input)?;
            let records = extractor.extract(&text);
            let mut written = Vec::new();

            if format.csv() {
                let path = export::output_path(out_dir, input, &stamp, "csv");
                export::save_csv(&records, extractor.settings(), &path)?;
                written.push(path);
            }
            if format.json() {
                let path = export::output_path(out_dir, input, &stamp, "json");
                export::save_json(&records, &path)?;
                written.push(path);
            }

            pb.inc(1);
            Ok(FileResult {
                input: input.clone(),
                records: records.len(),
                written,
            })
        })
        .collect();
    pb.finish_and_clear();

    let mut total = 0;
    let mut failed = 0;
    for result in results {
        match result {
            Ok(file) => {
                total += file.records;
                println!("{}: {} records", file.input.display(), file.records);
                for path in &file.written {
                    println!("  -> {}", path.display());
                }
            }
            Err(e) => {
                failed += 1;
                tracing::error!("{:#}", e);
            }
        }
    }

    println!("\n{} records from {} files ({} failed)", total, inputs.len(), failed);
    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, inputs.len());
    }
    Ok(())
}

/// Documents are concatenated into a single CSV with one header row.
fn print_csv(extractor: &Extractor, inputs: &[PathBuf]) -> anyhow::Result<()> {
    let mut records: Vec<Record> = Vec::new();
    for input in inputs {
        let text = read_input(input)?;
        records.extend(extractor.extract(&text));
    }
    export::write_csv(&records, extractor.settings(), io::stdout().lock())?;
    Ok(())
}

fn inspect(extractor: &Extractor, input: &Path) -> anyhow::Result<()> {
    let text = read_input(input)?;
    let classifier = extractor.classifier();

    let mut blocks = 0;
    for (i, block) in extractor.segmenter(&text).blocks().enumerate() {
        blocks += 1;
        println!("--- block {} ---", i + 1);
        for line in &block.lines {
            let normalized = normalize_line(line);
            let kinds: Vec<&str> = classifier
                .classify(&normalized)
                .iter()
                .map(|f| f.kind())
                .collect();
            println!("  {:<40} | {}", truncate(&normalized, 40), kinds.join(", "));
        }
    }

    if blocks == 0 {
        println!("No team headers found.");
    } else {
        println!("\n{} blocks", blocks);
    }
    Ok(())
}

/// Cut to `max` chars (not bytes) and mark the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
