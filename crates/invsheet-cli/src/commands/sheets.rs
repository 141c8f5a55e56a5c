//! Workbook commands: `sheets` and `clear`.

use std::path::PathBuf;

use clap::Args;
use console::{Term, style};

use invsheet_core::sheet::{clear_sheet, sheet_choices};

use super::with_xlsx_extension;

/// Arguments for the sheets command.
#[derive(Args)]
pub struct SheetsArgs {
    /// Workbook
    workbook: PathBuf,
}

/// Arguments for the clear command.
#[derive(Args)]
pub struct ClearArgs {
    /// Workbook
    workbook: PathBuf,

    /// Sheet to clear
    #[arg(short, long)]
    sheet: String,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
}

pub async fn run_sheets(args: SheetsArgs) -> anyhow::Result<()> {
    let path = with_xlsx_extension(&args.workbook);
    if !path.exists() {
        eprintln!(
            "{} {} does not exist yet; appending creates it",
            style("ℹ").blue(),
            path.display()
        );
    }

    let choices = sheet_choices(&path)?;
    for (i, name) in choices.iter().enumerate() {
        if i == 0 {
            println!("{}", style(name).dim());
        } else {
            println!("{}", name);
        }
    }
    Ok(())
}

pub async fn run_clear(args: ClearArgs) -> anyhow::Result<()> {
    let path = with_xlsx_extension(&args.workbook);

    if !args.yes {
        let term = Term::stderr();
        term.write_str(&format!(
            "Delete every row below the header of '{}' in {}? [y/N] ",
            args.sheet,
            path.display()
        ))?;
        let answer = term.read_line()?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("{} Nothing cleared", style("ℹ").blue());
            return Ok(());
        }
    }

    let removed = clear_sheet(&path, &args.sheet)?;
    println!(
        "{} Cleared {} row(s) from '{}'",
        style("✓").green(),
        removed,
        args.sheet
    );
    Ok(())
}
