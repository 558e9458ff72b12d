//! confkit CLI - Command-line interface for confkit configuration resolution
//!
//! Usage:
//!   confkit get server.port app.yaml --env
//!   confkit dump base.yaml prod.yaml --set server.port=9090
//!   confkit check app.yaml

use std::path::PathBuf;
use std::process::ExitCode;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use confkit_core::{Config, DecoderRegistry, Entry, KeyValue, MemorySource, Source, Value};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::sources::{format_for, EnvSource, FileSource};

/// confkit - Assemble configuration from files and the environment
#[derive(Parser)]
#[command(name = "confkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Where configuration records come from
#[derive(clap::Args, Debug, Clone, Default)]
struct SourceArgs {
    /// Configuration file(s), merged in order
    files: Vec<PathBuf>,

    /// Read process environment variables after the files
    #[arg(short, long)]
    env: bool,

    /// Only take environment variables with this prefix (stripped from keys)
    #[arg(short, long, requires = "env")]
    prefix: Option<String>,

    /// Set a value (KEY=VALUE), applied last
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Get a specific value from the configuration
    Get {
        /// Path to the value (e.g., database.host)
        path: String,

        #[command(flatten)]
        sources: SourceArgs,

        /// Convert the value to this type before printing
        #[arg(short = 't', long = "type")]
        value_type: Option<ValueType>,

        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Default value if key not found
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Export the resolved configuration
    Dump {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output format: yaml, json
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Quick syntax check of configuration files
    Check {
        /// Configuration file(s) to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Typed conversions offered by `get --type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ValueType {
    String,
    Int,
    Float,
    Bool,
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Get {
            path,
            sources,
            value_type,
            format,
            default,
        } => cmd_get(&sources, &path, value_type, &format, default),

        Commands::Dump {
            sources,
            format,
            output,
        } => cmd_dump(&sources, &format, output),

        Commands::Check { files } => cmd_check(files),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .try_init();
}

fn parse_set(assignment: &str) -> Result<KeyValue, String> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok(KeyValue::new(key.trim(), value)),
        _ => Err(format!(
            "Invalid --set '{}': expected KEY=VALUE",
            assignment
        )),
    }
}

fn build_config(args: &SourceArgs) -> Result<Config, String> {
    if args.files.is_empty() && !args.env && args.set.is_empty() {
        return Err("No configuration sources specified".to_string());
    }

    let mut builder = Config::builder();
    for file in &args.files {
        builder = builder.source(FileSource::new(file));
    }
    if args.env {
        builder = builder.source(EnvSource::new(args.prefix.clone()));
    }
    if !args.set.is_empty() {
        let records = args
            .set
            .iter()
            .map(|s| parse_set(s))
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.source(MemorySource::new("command line", records));
    }

    let config = builder.build();
    config
        .load()
        .map_err(|e| format!("Failed to load configuration: {}", e))?;
    Ok(config)
}

fn typed_value(entry: &Entry<'_>, value_type: Option<ValueType>) -> confkit_core::Result<Value> {
    match value_type {
        None => Ok(entry.load()),
        Some(ValueType::String) => entry.string().map(Value::String),
        Some(ValueType::Int) => entry.int().map(Value::Integer),
        Some(ValueType::Float) => entry.float().map(Value::Float),
        Some(ValueType::Bool) => entry.bool().map(Value::Bool),
    }
}

fn render(value: &Value, format: &str) -> Result<String, String> {
    match format {
        "json" => serde_json::to_string_pretty(value)
            .map(|json| json + "\n")
            .map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        "text" => match value {
            Value::Bytes(bytes) => Ok(match std::str::from_utf8(bytes) {
                Ok(text) => format!("{}\n", text),
                // Binary payloads are printed as base64
                Err(_) => format!("{}\n", STANDARD.encode(bytes)),
            }),
            Value::Sequence(_) | Value::Mapping(_) => {
                serde_yaml::to_string(value).map_err(|e| e.to_string())
            }
            other => Ok(format!("{}\n", other)),
        },
        other => Err(format!(
            "Unsupported format: {}. Use text, json, or yaml.",
            other
        )),
    }
}

fn write_output(content: &str, output: Option<PathBuf>) -> ExitCode {
    if let Some(output_path) = output {
        if let Err(e) = std::fs::write(&output_path, content) {
            eprintln!("{}: {}", "Error writing file".red(), e);
            return ExitCode::from(2);
        }
        eprintln!("{} Wrote to {}", "✓".green(), output_path.display());
    } else {
        print!("{}", content);
    }
    ExitCode::SUCCESS
}

fn cmd_get(
    sources: &SourceArgs,
    path: &str,
    value_type: Option<ValueType>,
    format: &str,
    default: Option<String>,
) -> ExitCode {
    let config = match build_config(sources) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let reader = config.reader();
    let Some(entry) = reader.value(path) else {
        return match default {
            Some(default_val) => {
                println!("{}", default_val);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("{}: Path '{}' not found", "Error".red(), path);
                ExitCode::from(1)
            }
        };
    };

    let rendered = typed_value(&entry, value_type)
        .map_err(|e| e.to_string())
        .and_then(|value| render(&value, format));
    match rendered {
        Ok(content) => {
            print!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_dump(sources: &SourceArgs, format: &str, output: Option<PathBuf>) -> ExitCode {
    let config = match build_config(sources) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let result = match format {
        "json" => config.to_json().map(|json| json + "\n"),
        "yaml" | "yml" => config.to_yaml(),
        other => {
            eprintln!("Unsupported format: {}. Use yaml or json.", other);
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(content) => write_output(&content, output),
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn check_file(file: &PathBuf, decoders: &DecoderRegistry) -> Result<String, String> {
    let records = FileSource::new(file).load().map_err(|e| e.to_string())?;
    for record in &records {
        decoders.decode(record).map_err(|e| e.to_string())?;
    }
    Ok(match format_for(file) {
        Some("json") => "valid JSON".to_string(),
        Some(_) => "valid YAML".to_string(),
        None => match records.first() {
            Some(record) => format!("raw, stored under '{}'", record.key),
            None => "raw".to_string(),
        },
    })
}

fn cmd_check(files: Vec<PathBuf>) -> ExitCode {
    let decoders = DecoderRegistry::with_builtins();
    let mut all_valid = true;

    for file in files {
        match check_file(&file, &decoders) {
            Ok(summary) => println!("{} {}: {}", "✓".green(), file.display(), summary),
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
