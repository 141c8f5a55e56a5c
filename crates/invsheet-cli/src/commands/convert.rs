//! Convert command - append a folder of PDF invoices to a workbook.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Args;
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use invsheet_core::sheet::{AppendOutcome, SheetAppender, SheetTarget};
use invsheet_core::{BatchJob, InvsheetError, PdfRecord, ProgressEvent};

use super::{load_config, with_xlsx_extension};

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Folder containing PDF invoices
    folder: PathBuf,

    /// Destination workbook (".xlsx" is added if missing)
    #[arg(short, long)]
    output: PathBuf,

    /// Sheet to append to, created if missing ("[Create New Sheet]" picks a new name)
    #[arg(short, long, conflicts_with = "new_sheet")]
    sheet: Option<String>,

    /// Append to a new "PDF Files" sheet
    #[arg(long)]
    new_sheet: bool,

    /// Pages scanned per PDF for mapped fields
    #[arg(long)]
    max_pages: Option<usize>,

    /// Workbook to write instead if the output cannot be written
    #[arg(long)]
    save_as: Option<PathBuf>,

    /// Fail instead of asking for another name when the output cannot be written
    #[arg(long)]
    no_prompt: bool,

    /// Write a JSON report of the run
    #[arg(long)]
    report: Option<PathBuf>,
}

/// JSON report written with `--report`.
#[derive(Serialize)]
struct RunReport<'a> {
    generated_at: DateTime<Local>,
    folder: &'a Path,
    fields: Vec<&'a str>,
    outcome: &'a AppendOutcome,
    failed: &'a [String],
    records: &'a [PdfRecord],
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let target = if args.new_sheet {
        SheetTarget::CreateNew
    } else {
        SheetTarget::from_choice(
            args.sheet
                .as_deref()
                .unwrap_or(config.output.default_sheet.as_str()),
        )
    };
    let job = BatchJob::new(&args.folder, config.mapping.clone())
        .with_max_pages(args.max_pages.unwrap_or(config.extraction.max_pages));

    if job.mapping.is_empty() {
        println!("{} Extracting: Total Amount", style("ℹ").blue());
    } else {
        println!(
            "{} Extracting: {}",
            style("ℹ").blue(),
            job.mapping.fields().join(", ")
        );
    }

    let (records, failed) = collect_with_progress(&job).await?;

    let appender = SheetAppender::new().with_link_text(config.output.link_text.as_str());
    let outcome = write_with_retry(&job, &records, &args, &target, &appender)?;

    println!();
    println!(
        "{} Processed {} file(s) in {:?}",
        style("✓").green(),
        records.len(),
        start.elapsed()
    );
    println!(
        "   {} row(s) appended to sheet '{}' in {}",
        style(outcome.appended).green(),
        outcome.sheet,
        outcome.path.display()
    );
    if outcome.duplicates > 0 {
        println!(
            "{} Skipped {} duplicate file(s)",
            style("⚠").yellow(),
            outcome.duplicates
        );
    }
    if !failed.is_empty() {
        println!();
        println!("{}", style("Unreadable files:").red());
        for name in &failed {
            println!("  - {}", name);
        }
    }

    if let Some(report_path) = &args.report {
        let report = RunReport {
            generated_at: Local::now(),
            folder: &args.folder,
            fields: job.mapping.fields().iter().map(String::as_str).collect(),
            outcome: &outcome,
            failed: &failed,
            records: &records,
        };
        fs::write(report_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing report {}", report_path.display()))?;
        println!(
            "{} Report written to {}",
            style("✓").green(),
            report_path.display()
        );
    }

    Ok(())
}

/// Run extraction on a blocking worker and drive a progress bar from its
/// events. Returns the records and the names of unreadable files.
async fn collect_with_progress(job: &BatchJob) -> anyhow::Result<(Vec<PdfRecord>, Vec<String>)> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let worker_job = job.clone();
    let worker = tokio::task::spawn_blocking(move || {
        worker_job.collect(|event| {
            // The receiver only goes away if the command is already failing.
            let _ = tx.send(event);
        })
    });

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut failed = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Scanned { total } => pb.set_length(total as u64),
            ProgressEvent::FileStarted { name, .. } => pb.set_message(name),
            ProgressEvent::FileExtracted { name, values } => {
                debug!("{}: {}", name, values.join(" | "));
                pb.inc(1);
            }
            ProgressEvent::FileFailed { name } => {
                pb.println(format!("{} Could not read {}", style("⚠").yellow(), name));
                failed.push(name);
                pb.inc(1);
            }
            ProgressEvent::Finished { .. } => pb.finish_with_message("Extracted"),
        }
    }
    pb.finish_and_clear();

    let records = worker.await.context("extraction worker stopped")??;
    Ok((records, failed))
}

/// Append records, asking for another file name while the workbook is locked.
fn write_with_retry(
    job: &BatchJob,
    records: &[PdfRecord],
    args: &ConvertArgs,
    target: &SheetTarget,
    appender: &SheetAppender,
) -> anyhow::Result<AppendOutcome> {
    let mut destination = with_xlsx_extension(&args.output);
    let mut save_as = args.save_as.as_deref().map(with_xlsx_extension);

    loop {
        match job.write(records, &destination, target, appender) {
            Ok(outcome) => return Ok(outcome),
            Err(InvsheetError::Sheet(e)) if e.is_locked() => {
                eprintln!("{} {}", style("⚠").yellow(), e);
                destination = match save_as.take() {
                    Some(path) => path,
                    None if args.no_prompt => anyhow::bail!(e),
                    None => prompt_for_name()?,
                };
                println!(
                    "{} Saving to {} instead",
                    style("ℹ").blue(),
                    destination.display()
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn prompt_for_name() -> anyhow::Result<PathBuf> {
    let term = Term::stderr();
    term.write_str("New workbook name (empty to cancel): ")?;
    let name = term.read_line()?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Cancelled; nothing was written");
    }
    Ok(with_xlsx_extension(Path::new(name)))
}
