use clap::{Parser, Subcommand};
use flowdl::prelude::*;
use std::fs;

/// A bidirectional FlowModel / FDL workflow compiler CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile an FDL document into a FlowModel JSON snapshot
    Compile {
        /// Path to the FDL document
        path: String,
        /// Emit compact JSON instead of pretty-printed
        #[arg(short, long)]
        compact: bool,
    },
    /// Emit FDL text from a FlowModel JSON snapshot
    Emit {
        /// Path to the FlowModel JSON file
        path: String,
    },
    /// Round-trip an FDL document and report what survives
    Check {
        /// Path to the FDL document
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Compile { path, compact } => run_compile(&path, compact),
        Command::Emit { path } => run_emit(&path),
        Command::Check { path } => run_check(&path),
    }
}

fn run_compile(path: &str, compact: bool) {
    let flow = load_flow(path);
    let json = if compact {
        serde_json::to_string(&flow)
    } else {
        serde_json::to_string_pretty(&flow)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => exit_with_error(&format!("Failed to encode flow as JSON: {}", e)),
    }
}

fn run_emit(path: &str) {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)));
    let flow: FlowModel = serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse flow JSON: {}", e)));
    let text = serialize(&flow)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to emit FDL: {}", e)));
    print!("{text}");
}

fn run_check(path: &str) {
    let flow = load_flow(path);
    let text = serialize(&flow)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to emit FDL: {}", e)));
    let reparsed = deserialize(&text);
    if let Some(error) = reparsed.error {
        exit_with_error(&format!("Re-parse of emitted FDL failed: {}", error));
    }

    println!("nodes: {} -> {}", flow.nodes.len(), reparsed.flow.nodes.len());
    println!("edges: {} -> {}", flow.edges.len(), reparsed.flow.edges.len());
    let drift = flow.nodes.len() != reparsed.flow.nodes.len()
        || flow.edges.len() != reparsed.flow.edges.len();
    if drift {
        exit_with_error("Round trip drifted");
    }
    println!("Round trip OK");
}

fn load_flow(path: &str) -> FlowModel {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)));
    let outcome = deserialize(&text);
    if let Some(error) = outcome.error {
        exit_with_error(&format!("Failed to parse FDL: {}", error));
    }
    outcome.flow
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
