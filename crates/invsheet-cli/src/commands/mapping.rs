//! Mapping command - manage the persisted field mapping.

use clap::{Args, Subcommand};
use console::style;

use invsheet_core::ConfigError;
use invsheet_core::models::{FieldMapping, InvsheetConfig};
use invsheet_core::sheet::header_row;

use super::config_path;

/// Arguments for the mapping command.
#[derive(Args)]
pub struct MappingArgs {
    #[command(subcommand)]
    command: MappingCommand,
}

#[derive(Subcommand)]
enum MappingCommand {
    /// Show the mapped fields and the resulting columns
    Show,

    /// Append fields to the mapping
    Add {
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Remove fields from the mapping
    Remove {
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Replace the mapping
    Set {
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Remove every field and go back to the Total Amount column
    Clear,

    /// Show configuration file path
    Path,
}

pub async fn run(args: MappingArgs, config: Option<&str>) -> anyhow::Result<()> {
    let path = config_path(config);
    let mut settings = InvsheetConfig::load_or_default(&path)?;

    match args.command {
        MappingCommand::Show => {
            show(&settings.mapping);
            return Ok(());
        }
        MappingCommand::Path => {
            println!("Configuration file: {}", path.display());
            if path.exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
            }
            return Ok(());
        }
        MappingCommand::Add { fields } => {
            for field in &fields {
                match settings.mapping.push(field) {
                    Ok(()) => println!("{} Added '{}'", style("✓").green(), field.trim()),
                    Err(e @ ConfigError::DuplicateField(_)) => {
                        println!("{} {}", style("⚠").yellow(), e)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        MappingCommand::Remove { fields } => {
            for field in &fields {
                if settings.mapping.remove(field) {
                    println!("{} Removed '{}'", style("✓").green(), field.trim());
                } else {
                    println!("{} '{}' is not mapped", style("⚠").yellow(), field.trim());
                }
            }
        }
        MappingCommand::Set { fields } => {
            settings.mapping = FieldMapping::new(&fields)?;
        }
        MappingCommand::Clear => {
            settings.mapping.clear();
            println!("{} Mapping cleared", style("✓").green());
        }
    }

    settings.save(&path)?;
    show(&settings.mapping);
    Ok(())
}

fn show(mapping: &FieldMapping) {
    if mapping.is_empty() {
        println!(
            "{} No fields mapped; the Total Amount column is used",
            style("ℹ").blue()
        );
    } else {
        for (i, field) in mapping.fields().iter().enumerate() {
            println!("  {}. {}", i + 1, field);
        }
    }
    println!("Columns: {}", header_row(mapping).join(" | "));
}
