//! CLI driver: `cwasmc [--print-ast | --print-ir] <source.c>` (spec.md §6).
//!
//! Argument parsing, file I/O, and process exit codes are the one part of
//! this system the specification deliberately leaves to the embedder —
//! this file just supplies the inputs (source text, output path) the
//! library pipeline needs and reports the outcome it returns.

use std::path::Path;
use std::process::ExitCode;
use std::{env, fs};

use cwasmc::diagnostics::DiagnosticList;
use cwasmc::{compile, Output, PrintMode};
use saying::say;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return ExitCode::FAILURE;
    }

    let mut print_mode = PrintMode::None;
    let mut input_path: Option<&str> = None;

    for arg in &args[1..] {
        match arg.as_str() {
            "--print-ast" => print_mode = PrintMode::Ast,
            "--print-ir" => print_mode = PrintMode::Ir,
            other if input_path.is_none() => input_path = Some(other),
            other => {
                say!(Red "Error: Unknown option or multiple input files: ", other);
                return ExitCode::FAILURE;
            }
        }
    }

    let Some(input_path) = input_path else {
        say!(Red "Error: No input file specified");
        return ExitCode::FAILURE;
    };

    let source = match fs::read_to_string(input_path) {
        Ok(source) => source,
        Err(_) => {
            say!(Red "Error: Could not read file ", input_path);
            return ExitCode::FAILURE;
        }
    };

    let mut diagnostics = DiagnosticList::new();
    let output = compile(&source, print_mode, &mut diagnostics);

    if diagnostics.has_fatal() {
        diagnostics.print(Path::new(input_path), &source);
        return ExitCode::FAILURE;
    }

    match output {
        Some(Output::Ast(text)) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Some(Output::Ir(text)) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Some(Output::Wasm(bytes)) => {
            let out_path = cwasmc::diagnostics::default_output_path();
            if fs::write(&out_path, bytes).is_err() {
                say!(Red "Error: Could not write ", out_path.display());
                return ExitCode::FAILURE;
            }
            say!(Green "Compilation successful. Output written to ", out_path.display());
            ExitCode::SUCCESS
        }
        None => {
            diagnostics.print(Path::new(input_path), &source);
            ExitCode::FAILURE
        }
    }
}

fn print_usage(program_name: &str) {
    say!("Usage: ", program_name, " [options] <source.c>");
    say!("Options:");
    say!("  --print-ast    Print the AST and exit");
    say!("  --print-ir     Print the IR and exit");
}
