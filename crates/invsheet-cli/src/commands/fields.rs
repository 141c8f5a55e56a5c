//! Field inspection commands: `fields`, `extract` and `amount`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::info;

use invsheet_core::models::{FieldMap, NOT_FOUND};
use invsheet_core::{FieldExtractor, common_fields, default_amount_from_file, read_pages, scan_pdf_folder};

use super::load_config;

/// Arguments for the fields command.
#[derive(Args)]
pub struct FieldsArgs {
    /// PDF file, or a folder of PDFs
    input: PathBuf,

    /// Pages scanned per PDF
    #[arg(long)]
    max_pages: Option<usize>,

    /// Number of files analyzed when given a folder
    #[arg(short, long, default_value = "5")]
    limit: usize,

    /// Print JSON instead of a list
    #[arg(long)]
    json: bool,
}

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// PDF file
    pdf: PathBuf,

    /// Field to extract (repeatable)
    #[arg(short = 'f', long = "field", required = true, num_args = 1..)]
    fields: Vec<String>,

    /// Pages scanned
    #[arg(long)]
    max_pages: Option<usize>,
}

/// Arguments for the amount command.
#[derive(Args)]
pub struct AmountArgs {
    /// PDF file
    pdf: PathBuf,
}

pub async fn run_fields(args: FieldsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let extractor =
        FieldExtractor::new().with_max_pages(args.max_pages.unwrap_or(config.extraction.max_pages));

    if args.input.is_dir() {
        let files = scan_pdf_folder(&args.input)?;
        let sample: Vec<_> = files.iter().take(args.limit.max(1)).collect();
        info!("Analyzing {} of {} file(s)", sample.len(), files.len());

        let maps: Vec<FieldMap> = sample.iter().map(|p| extractor.fields_from_file(p)).collect();
        let common = common_fields(&maps);

        if args.json {
            let json = serde_json::json!({
                "files_analyzed": sample.len(),
                "fields": common,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(());
        }

        println!(
            "{} Fields found in all {} analyzed file(s):",
            style("ℹ").blue(),
            sample.len()
        );
        if common.is_empty() {
            println!("  {}", style("(none)").dim());
        }
        for name in &common {
            let example = maps[0].get(name).map(String::as_str).unwrap_or_default();
            println!("  {} {}", style(name).bold(), style(format!("(e.g. {example})")).dim());
        }
        return Ok(());
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let pages = read_pages(&args.input, Some(extractor.max_pages()))
        .with_context(|| format!("reading {}", args.input.display()))?;
    let fields = extractor.extract_fields(&pages);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    if fields.is_empty() {
        println!("{} No fields detected", style("⚠").yellow());
    }
    for (name, value) in &fields {
        println!("  {}: {}", style(name).bold(), value);
    }
    Ok(())
}

pub async fn run_extract(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let extractor =
        FieldExtractor::new().with_max_pages(args.max_pages.unwrap_or(config.extraction.max_pages));

    if !args.pdf.exists() {
        anyhow::bail!("Input file not found: {}", args.pdf.display());
    }
    let pages = read_pages(&args.pdf, Some(extractor.max_pages()))
        .with_context(|| format!("reading {}", args.pdf.display()))?;
    let found = extractor.extract_named_fields(&pages, args.fields.as_slice());

    for name in &args.fields {
        match found.get(name) {
            Some(value) => println!("{} {}: {}", style("✓").green(), name, value),
            None => println!("{} {}: {}", style("⚠").yellow(), name, NOT_FOUND),
        }
    }
    Ok(())
}

pub async fn run_amount(args: AmountArgs) -> anyhow::Result<()> {
    if !args.pdf.exists() {
        anyhow::bail!("Input file not found: {}", args.pdf.display());
    }
    println!("{}", default_amount_from_file(&args.pdf));
    Ok(())
}
