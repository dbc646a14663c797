//! callsweep CLI
//!
//! Actions:
//!   error_call_refactor - consolidate severe/continue/fatal chains into emit* calls
//!   error_call_flatten  - normalize matched calls onto single lines
//!
//! Extra commands: schema, version, help

use callsweep::*;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "schema" => cmd_schema(&args[2..]),
        "version" | "--version" | "-v" => {
            println!("callsweep {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        action_name => cmd_run_action(action_name, &args[2..]),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"
callsweep - parsing, analysis, and refactoring services for error call work

USAGE:
    callsweep <ACTION> <SOURCE_REPOSITORY> <OUTPUT_DIRECTORY> [OPTIONS]
    callsweep <COMMAND> [ARGS]

ACTIONS:
    error_call_refactor    Consolidate severe/continue/fatal chains into the
                           emitErrorMessage(s)/emitWarningMessage(s) interface
    error_call_flatten     Normalize every matched call onto a single line

COMMANDS:
    schema [name]          Print the JSON schema for an output type
    version                Print the tool version
    help                   Show this message

OPTIONS:
    --in-place, -i         Rewrite call sites in the source repository itself.
                           Commit first; this overwrites files.
    --verbose              Debug-level logging (RUST_LOG overrides)

EXAMPLES:
    callsweep error_call_refactor ~/repos/EnergyPlus /tmp/sweep-out
    callsweep error_call_refactor ~/repos/EnergyPlus /tmp/sweep-out --in-place
    callsweep schema results
"#
    );
}

fn cmd_run_action(name: &str, args: &[String]) -> Result<()> {
    let action = match actions::action_by_name(name) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            return Err(e);
        }
    };

    let positionals: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
    if positionals.len() < 2 {
        return Err(format!(
            "Usage: callsweep {} <source_repository> <output_directory> [--in-place]",
            name
        )
        .into());
    }
    let source_repo = PathBuf::from(positionals[0]);
    let output_dir = PathBuf::from(positionals[1]);
    let in_place = args.iter().any(|a| a == "--in-place" || a == "-i");
    let verbose = args.iter().any(|a| a == "--verbose");

    logging::init(verbose);
    tracing::info!(action = name, source = %source_repo.display(), "starting callsweep run");

    action.run(&source_repo, &output_dir, in_place)
}

fn cmd_schema(args: &[String]) -> Result<()> {
    let schema_name = args.first().map(|s| s.as_str()).unwrap_or("list");

    match schema_name {
        "list" => {
            println!("Available schemas: results, file, group, summary");
            Ok(())
        }
        "results" => print_schema::<reports::RunSummary>(),
        "file" => print_schema::<reports::FileReport>(),
        "group" => print_schema::<reports::GroupJson>(),
        "summary" => print_schema::<reports::GroupSummary>(),
        _ => Err(format!("Unknown schema: {}", schema_name).into()),
    }
}

fn print_schema<T: schemars::JsonSchema>() -> Result<()> {
    let schema = schemars::schema_for!(T);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
