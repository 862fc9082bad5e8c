//! Command-line entry point.
//!
//! ```sh
//! sheetpipe --config config/settings.yaml
//! sheetpipe --skip-validation --quiet
//! ```

use clap::Parser;
use sheetpipe::config::DEFAULT_CONFIG_PATH;
use sheetpipe::{run, Config, Level, RunContext};
use std::path::PathBuf;
use std::process::ExitCode;

/// Convert every sheet of an Excel workbook into its own Parquet file
#[derive(Parser, Debug)]
#[command(name = "sheetpipe", version)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Do not read written files back
    #[arg(long)]
    skip_validation: bool,

    /// Suppress log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Include debug records in the log
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let ctx = if args.quiet {
        RunContext::silent()
    } else if args.verbose {
        RunContext::stdout("pipeline").with_min_level(Level::Debug)
    } else {
        RunContext::stdout("pipeline")
    };

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            ctx.error(&e.to_string());
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.skip_validation {
        config.writer.validate_output = false;
    }
    ctx.debug(&format!("Loaded configuration from {}", args.config.display()));

    match run(&config, &ctx) {
        Ok(report) => {
            if !args.quiet {
                for sheet in &report.sheets {
                    println!("{}", sheet);
                }
                for (path, result) in &report.validations {
                    match result {
                        Ok(summary) => println!("[valid] {}", summary),
                        Err(e) => println!("[invalid] {}: {}", path.display(), e),
                    }
                }
                println!("{}", report);
            }

            if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
