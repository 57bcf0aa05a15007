//! ISA CLI - convert between metadata spreadsheets and MODS documents
//!
//! # Main Commands
//!
//! ```bash
//! isa convert records.csv mods/     # File input: CSV → one MODS document per row
//! isa convert mods/ records.csv     # Directory input: MODS documents → CSV
//! isa to-xml records.csv mods/      # Explicit CSV → MODS
//! isa to-csv mods/ records.csv      # Explicit MODS → CSV
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! isa inspect mods/2440814.xml      # Flatten one document, print JSON
//! isa columns                       # Print the spreadsheet header
//! ```

use clap::{Parser, Subcommand};
use isa::logs::{LogFormat, LOGGER};
use isa::transform::pipeline::parse_reorder;
use isa::{
    convert, csv_to_documents, documents_to_csv, flatten_bytes, header, ConversionReport,
    TransformOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "isa")]
#[command(about = "Convert archival metadata between spreadsheets and MODS", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Compound-object reorder strategy: identifier, pattern or none
    #[arg(long, global = true)]
    reorder: Option<String>,

    /// Also write a Dublin Core document (<name>_dc.xml) per row
    #[arg(long, global = true)]
    dublin_core: bool,

    /// JSON options file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print log entries as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert, choosing the direction from the input (directory or file)
    Convert {
        /// Input CSV file or directory of MODS documents
        input: PathBuf,
        /// Output directory (for CSV input) or CSV file (for directory input)
        output: PathBuf,
    },

    /// Flatten a directory of MODS documents into one CSV file
    ToCsv {
        /// Directory of *.xml files
        input: PathBuf,
        /// Output CSV file
        output: PathBuf,
    },

    /// Build one MODS document per CSV row
    ToXml {
        /// Input CSV file
        input: PathBuf,
        /// Output directory
        output: PathBuf,
    },

    /// Flatten a single MODS document and print it as JSON
    Inspect {
        /// MODS document
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the spreadsheet header in column order
    Columns,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.log_json {
        LOGGER.set_format(LogFormat::Json);
    }

    let result = match resolve_options(&cli) {
        Ok(options) => run(cli.command, &options),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Defaults, then the config file, then the environment, then flags.
fn resolve_options(cli: &Cli) -> Result<TransformOptions, Box<dyn std::error::Error>> {
    let options = match &cli.config {
        Some(path) => TransformOptions::from_file(path)?,
        None => TransformOptions::default(),
    };
    let mut options = options.with_env()?;

    if let Some(reorder) = &cli.reorder {
        options.reorder = parse_reorder(reorder)?;
    }
    if cli.dublin_core {
        options.dublin_core = true;
    }
    Ok(options)
}

fn run(command: Commands, options: &TransformOptions) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Convert { input, output } => {
            eprintln!("📄 Processing: {}", input.display());
            report(&convert(&input, &output, options)?)
        }
        Commands::ToCsv { input, output } => {
            eprintln!("📂 Flattening: {}", input.display());
            report(&documents_to_csv(&input, &output, options)?)
        }
        Commands::ToXml { input, output } => {
            eprintln!("📄 Building: {}", input.display());
            report(&csv_to_documents(&input, &output, options)?)
        }
        Commands::Inspect { input, output } => cmd_inspect(&input, output.as_deref()),
        Commands::Columns => {
            println!("{}", header().join("\n"));
            Ok(())
        }
    }
}

fn report(report: &ConversionReport) -> Result<(), Box<dyn std::error::Error>> {
    if !report.skipped.is_empty() {
        eprintln!("\n⚠️  Skipped {}:", report.skipped.len());
        for d in &report.skipped {
            eprintln!("   - {}: {}", d.source, d.message);
        }
    }
    eprintln!("\n✨ Done! {} records written", report.written);
    Ok(())
}

fn cmd_inspect(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Inspecting: {}", input.display());

    let content = fs::read(input)?;
    let record = flatten_bytes(&content)?;

    let json = serde_json::to_string_pretty(&record)?;
    write_output(&json, output)?;

    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
