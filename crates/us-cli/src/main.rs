//! Userstyle Converter CLI
//!
//! CLI tool for turning userstyles into userscripts and inspecting how
//! their `@-moz-document` blocks translate.

mod config;
mod logger;
mod report;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use us_compiler::convert_userstyle;

use crate::config::{load_metadata, MetadataFlags};

#[derive(Parser)]
#[command(name = "us-cli")]
#[command(about = "Userstyle to userscript converter")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a userstyle into a userscript
    Convert {
        /// Input stylesheet
        #[arg(short, long)]
        input: PathBuf,

        /// Output userscript file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Show how a userstyle's @-moz-document blocks translate
    Inspect {
        /// Input stylesheet
        #[arg(short, long)]
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct MetadataArgs {
    /// JSON file with name, namespace, author and homepage
    #[arg(long)]
    config: Option<PathBuf>,

    /// Script name
    #[arg(long)]
    name: Option<String>,

    /// Script namespace
    #[arg(long)]
    namespace: Option<String>,

    /// Script author
    #[arg(long)]
    author: Option<String>,

    /// Script homepage
    #[arg(long)]
    homepage: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            metadata,
        } => cmd_convert(&input, output.as_deref(), metadata),
        Commands::Inspect { input, json } => cmd_inspect(&input, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_input(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path.display(), e))
}

fn cmd_convert(input: &Path, output: Option<&Path>, args: MetadataArgs) -> Result<(), String> {
    let flags = MetadataFlags {
        name: args.name,
        namespace: args.namespace,
        author: args.author,
        homepage: args.homepage,
    };
    let metadata = load_metadata(args.config.as_deref(), flags)?;

    let start = Instant::now();
    let css = read_input(input)?;
    let script = convert_userstyle(&css, &metadata)
        .map_err(|e| format!("Failed to convert '{}': {}", input.display(), e))?;

    for diagnostic in &script.diagnostics {
        warn!("{}", diagnostic);
    }

    match output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
            file.write_all(script.text.as_bytes())
                .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
            info!(
                "Converted '{}' to '{}' ({} bytes, {} match patterns, {:.1}ms)",
                input.display(),
                path.display(),
                script.text.len(),
                script.match_patterns.patterns().len(),
                start.elapsed().as_secs_f64() * 1000.0,
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(script.text.as_bytes())
                .map_err(|e| format!("Failed to write to stdout: {}", e))?;
        }
    }

    if script.runs_everywhere() {
        warn!("No @match patterns: the script will run on every page");
    }

    Ok(())
}

fn cmd_inspect(input: &Path, json: bool) -> Result<(), String> {
    let css = read_input(input)?;
    let report = report::inspect(&css)
        .map_err(|e| format!("Failed to inspect '{}': {}", input.display(), e))?;

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        println!("{}", text);
    } else {
        report::print_report(&input.display().to_string(), &report);
    }

    Ok(())
}
