// cstep: run a C-subset program and report its result and recorded steps

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use cstep::pipeline;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("cstep");

    let mut file = None;
    let mut dump_steps = false;
    for arg in &args[1..] {
        match arg.as_str() {
            "--steps" => dump_steps = true,
            other => file = Some(other.to_string()),
        }
    }

    let Some(file) = file else {
        eprintln!("Usage: {program_name} [--steps] <file.c>");
        return ExitCode::FAILURE;
    };

    if !Path::new(&file).exists() {
        eprintln!("Error: file '{file}' not found");
        return ExitCode::FAILURE;
    }

    let source = match fs::read_to_string(&file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: failed to read '{file}': {err}");
            return ExitCode::FAILURE;
        }
    };

    let execution = match pipeline::run_source(&source) {
        Ok(execution) => execution,
        Err(err) => {
            eprintln!("{} error: {err}", err.stage());
            return ExitCode::FAILURE;
        }
    };

    match execution.result {
        Some(value) => println!("Program result: {value}"),
        None => println!("Program result: no value"),
    }
    println!("Recorded steps: {}", execution.dispatcher.steps_count());

    if dump_steps {
        for step in execution.dispatcher.steps() {
            println!("step {}:", step.number);
            for event in &step.events {
                println!("  {event:?}");
            }
        }
    }

    ExitCode::SUCCESS
}
