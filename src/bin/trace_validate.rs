use perf_to_trace::trace::validate;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        let program = args.first().map_or("trace_validate", String::as_str);
        eprintln!("Usage: {} <trace.json>", program);
        return ExitCode::from(2);
    }

    let path = &args[1];

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening '{}': {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    match validate(BufReader::new(file)) {
        Ok(summary) => {
            println!("Valid trace file: {}", path);
            println!("  Events: {}", summary.events);
            println!("  Processes: {}", summary.processes);
            println!("  Threads: {}", summary.threads);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid trace file '{}': {}", path, e);
            ExitCode::FAILURE
        }
    }
}
