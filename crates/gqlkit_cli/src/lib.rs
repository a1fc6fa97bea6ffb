//! Command-line interface for gqlkit.
//!
//! # Usage
//!
//! ```bash
//! # Print a document in canonical form
//! gqlkit parse query.graphql
//!
//! # Validate a schema, then validate documents against it
//! gqlkit check --schema schema.graphql query.graphql
//!
//! # Execute an operation against JSON root data
//! gqlkit execute --schema schema.graphql --root data.json query.graphql
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use gqlkit_core::{Diagnostic, Source};
use gqlkit_runtime::{ExecutionResult, Executor, Request};
use gqlkit_semantic::{assert_valid, build_schema, validate, BuildSchemaOptions, Schema, Variables};
use gqlkit_syntax::printer::print_with_options;
use gqlkit_syntax::{parse_with_options, Document, ParseOptions, PrintOptions};
use serde_json::{json, Value};
use tracing::debug;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "gqlkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a GraphQL document and print it in canonical form
    Parse {
        /// File to parse
        file: PathBuf,

        /// Indentation size
        #[arg(long, default_value = "2")]
        indent: usize,
    },

    /// Check a schema and validate documents against it
    Check {
        /// Schema file path
        #[arg(short, long)]
        schema: PathBuf,

        /// Executable documents to validate
        files: Vec<PathBuf>,

        /// Report diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute an operation against JSON root data
    Execute(ExecuteArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Schema file path
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Document containing the operation
    pub query: PathBuf,

    /// JSON file holding the root value
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// JSON file holding variable values
    #[arg(long)]
    pub variables: Option<PathBuf>,

    /// Operation to run when the document defines several
    #[arg(short, long)]
    pub operation: Option<String>,

    /// Print the result on a single line
    #[arg(long)]
    pub json: bool,
}

pub async fn run(cli: Cli) -> CliResult<i32> {
    match cli.command {
        Commands::Parse { file, indent } => parse_file(&file, indent),
        Commands::Check {
            schema,
            files,
            json,
        } => check_files(&schema, &files, json, cli.verbose, cli.quiet),
        Commands::Execute(args) => execute_file(&args, cli.verbose).await,
        Commands::Version => {
            println!("gqlkit {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Renders `diagnostic` as `file:line:column [code] message`.
pub fn format_diagnostic(path: &Path, source: &Source, diagnostic: &Diagnostic) -> String {
    let location = diagnostic
        .locations(source)
        .first()
        .map(|location| format!(":{location}"))
        .unwrap_or_default();
    format!(
        "{}{} [{}] {}",
        path.display(),
        location,
        diagnostic.code,
        diagnostic.message
    )
}

fn diagnostic_json(path: &Path, source: &Source, diagnostic: &Diagnostic) -> Value {
    let locations: Vec<Value> = diagnostic
        .locations(source)
        .iter()
        .map(|l| json!({ "line": l.line, "column": l.column }))
        .collect();
    json!({
        "file": path.display().to_string(),
        "code": diagnostic.code,
        "message": diagnostic.message,
        "locations": locations,
    })
}

/// Reads and parses `path`. Syntax errors are rendered to stderr and
/// yield `None`.
fn load_document(path: &Path) -> CliResult<Option<Document>> {
    let body = std::fs::read_to_string(path)?;
    let options = ParseOptions {
        source_name: path.display().to_string(),
        ..ParseOptions::default()
    };
    match parse_with_options(&body, &options) {
        Ok(document) => {
            debug!(file = %path.display(), definitions = document.definitions.len(), "parsed document");
            Ok(Some(document))
        }
        Err(error) => {
            eprintln!("{:?}", miette::Report::new(error));
            Ok(None)
        }
    }
}

/// Builds and validates the schema in `path`, reporting failures to stderr.
fn load_schema(path: &Path) -> CliResult<Option<Schema>> {
    let Some(document) = load_document(path)? else {
        return Ok(None);
    };
    let schema = match build_schema(&document, BuildSchemaOptions::default()) {
        Ok(schema) => schema,
        Err(error) => {
            eprintln!(
                "{} {}:{} {}",
                "Error".red().bold(),
                path.display(),
                document.location(error.span()),
                error
            );
            return Ok(None);
        }
    };
    if let Err(error) = assert_valid(&schema) {
        eprintln!("{} {}", "Error".red().bold(), path.display());
        for diagnostic in &error.errors {
            eprintln!(
                "  {} {}",
                "-->".blue(),
                format_diagnostic(path, &document.source, diagnostic)
            );
        }
        return Ok(None);
    }
    Ok(Some(schema))
}

fn read_json(path: &Path) -> CliResult<Value> {
    let body = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

fn read_variables(path: &Path) -> CliResult<Variables> {
    match read_json(path)? {
        Value::Object(variables) => Ok(variables),
        Value::Null => Ok(Variables::new()),
        _ => Err(format!("{}: variables must be a JSON object", path.display()).into()),
    }
}

fn parse_file(file: &Path, indent: usize) -> CliResult<i32> {
    let Some(document) = load_document(file)? else {
        return Ok(1);
    };
    let printed = print_with_options(&document, PrintOptions { indent_size: indent });
    println!("{printed}");
    Ok(0)
}

fn check_files(
    schema_path: &Path,
    files: &[PathBuf],
    json: bool,
    verbose: bool,
    quiet: bool,
) -> CliResult<i32> {
    if verbose {
        println!("{} {}", "Checking".blue(), schema_path.display());
    }
    let Some(schema) = load_schema(schema_path)? else {
        return Ok(1);
    };
    if !quiet && !json {
        println!("{} {}", "OK".green(), schema_path.display());
    }

    let mut has_errors = false;
    let mut report = Vec::new();

    for file in files {
        if verbose {
            println!("{} {}", "Checking".blue(), file.display());
        }
        let Some(document) = load_document(file)? else {
            has_errors = true;
            continue;
        };

        let diagnostics = validate(&schema, &document)?;
        if diagnostics.is_empty() {
            if !quiet && !json {
                println!("{} {}", "OK".green(), file.display());
            }
            continue;
        }

        has_errors = true;
        if json {
            report.extend(
                diagnostics
                    .iter()
                    .map(|d| diagnostic_json(file, &document.source, d)),
            );
        } else {
            eprintln!("{} {}", "Error".red().bold(), file.display());
            for diagnostic in &diagnostics {
                eprintln!(
                    "  {} {}",
                    "-->".blue(),
                    format_diagnostic(file, &document.source, diagnostic)
                );
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet && !has_errors {
        println!(
            "{} {} document(s) valid",
            "Success:".green().bold(),
            files.len()
        );
    }

    Ok(i32::from(has_errors))
}

async fn execute_file(args: &ExecuteArgs, verbose: bool) -> CliResult<i32> {
    let Some(schema) = load_schema(&args.schema)? else {
        return Ok(1);
    };
    let Some(document) = load_document(&args.query)? else {
        return Ok(1);
    };

    let diagnostics = validate(&schema, &document)?;
    if !diagnostics.is_empty() {
        eprintln!("{} {}", "Error".red().bold(), args.query.display());
        for diagnostic in &diagnostics {
            eprintln!(
                "  {} {}",
                "-->".blue(),
                format_diagnostic(&args.query, &document.source, diagnostic)
            );
        }
        return Ok(1);
    }

    let root = match &args.root {
        Some(path) => read_json(path)?,
        None => Value::Object(serde_json::Map::new()),
    };
    let variables = match &args.variables {
        Some(path) => read_variables(path)?,
        None => Variables::new(),
    };

    let document = Arc::new(document);
    let mut request = Request::new(Arc::clone(&document))
        .root_value(root)
        .variables(variables);
    if let Some(name) = &args.operation {
        request = request.operation_name(name.clone());
    }

    if verbose {
        eprintln!("{} {}", "Executing".blue(), args.query.display());
    }
    let result = match Executor::new(schema).execute(request).await {
        Ok(result) => result,
        Err(error) => ExecutionResult::errors(error.to_graphql_errors(&document)),
    };

    let output = if args.json {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{output}");

    Ok(i32::from(result.has_errors()))
}
