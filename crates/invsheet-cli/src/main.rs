//! CLI application for appending PDF invoice data to spreadsheets.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{convert, fields, mapping, sheets};

/// Extract fields from PDF invoices and append them to an Excel workbook
#[derive(Parser)]
#[command(name = "invsheet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append every PDF in a folder to a workbook
    Convert(convert::ConvertArgs),

    /// List the fields detected in a PDF or common to a folder of PDFs
    Fields(fields::FieldsArgs),

    /// Extract named fields from a PDF
    Extract(fields::ExtractArgs),

    /// Print the total amount of a PDF
    Amount(fields::AmountArgs),

    /// List the sheets of a workbook
    Sheets(sheets::SheetsArgs),

    /// Delete every data row of a sheet, keeping the header
    Clear(sheets::ClearArgs),

    /// Manage the field mapping
    Mapping(mapping::MappingArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Convert(args) => convert::run(args, config).await,
        Commands::Fields(args) => fields::run_fields(args, config).await,
        Commands::Extract(args) => fields::run_extract(args, config).await,
        Commands::Amount(args) => fields::run_amount(args).await,
        Commands::Sheets(args) => sheets::run_sheets(args).await,
        Commands::Clear(args) => sheets::run_clear(args).await,
        Commands::Mapping(args) => mapping::run(args, config).await,
    }
}
