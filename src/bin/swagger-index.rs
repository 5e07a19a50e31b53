//! Swagger Index CLI
//!
//! Command-line interface for normalizing Swagger documents and validating
//! request payloads against them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use swagger_index::{
    load_json, normalize, NormalizedIndex, ParamLocation, SchemaValidator, ValidateError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swagger-index")]
#[command(about = "Normalize Swagger 2.0 documents and validate request data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized operation/model index
    Normalize {
        /// Swagger 2.0 document (JSON)
        spec: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List operations: id, method, url and model
    Operations {
        /// Swagger 2.0 document (JSON)
        spec: PathBuf,
    },

    /// Validate a payload against an operation
    Validate {
        /// Swagger 2.0 document (JSON)
        spec: PathBuf,

        /// Payload file to validate
        payload: PathBuf,

        /// Operation id to validate for
        #[arg(long, short)]
        op: String,

        /// What the payload is
        #[arg(long, value_enum, default_value_t = Target::Body)]
        target: Target,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    /// Request body
    Body,
    /// Query string parameters
    Query,
    /// Path parameters
    Path,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "swagger_index=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Normalize {
            spec,
            output,
            pretty,
        } => run_normalize(&spec, output, pretty),
        Commands::Operations { spec } => run_operations(&spec),
        Commands::Validate {
            spec,
            payload,
            op,
            target,
            json,
        } => run_validate(&spec, &payload, &op, target, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load_index(spec_path: &Path, json_output: bool) -> Result<NormalizedIndex, u8> {
    let spec = load_json(spec_path).map_err(|e| {
        report_error(json_output, &format!("loading spec: {}", e));
        e.exit_code() as u8
    })?;

    normalize(&spec).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })
}

fn run_normalize(spec_path: &Path, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let index = load_index(spec_path, false)?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&index)
    } else {
        serde_json::to_string(&index)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_operations(spec_path: &Path) -> Result<(), u8> {
    let index = load_index(spec_path, false)?;

    for (id, operation) in &index.operations {
        println!(
            "{}\t{}\t{}\t{}",
            id,
            operation.method,
            operation.url,
            operation.model_name.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

fn run_validate(
    spec_path: &Path,
    payload_path: &Path,
    op: &str,
    target: Target,
    json_output: bool,
) -> Result<(), u8> {
    let index = load_index(spec_path, json_output)?;

    let payload = load_json(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let validator = SchemaValidator::new(&index);
    let result = match target {
        Target::Body => validator.validate_body(op, Some(&payload)),
        Target::Query => validator.validate_params(op, Some(&payload), ParamLocation::Query),
        Target::Path => validator.validate_params(op, Some(&payload), ParamLocation::Path),
    };

    match result {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { report }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "report": report
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for path in &report.required {
                    eprintln!("  {}: missing required field", path);
                }
                for error in &report.invalid_type {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
