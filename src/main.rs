use std::env;
use std::process::ExitCode;

use cc0::parse;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        let bin = args.first().map_or("cc0", String::as_str);
        eprintln!("{}: invalid number of arguments", bin);
        return ExitCode::FAILURE;
    }

    let src = &args[1];

    let program = match parse(src) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err.diagnostic(src));
            return ExitCode::FAILURE;
        }
    };

    for function in &program.functions {
        println!("{}", function);
        println!("# frame {}: {} bytes", function.name, function.stack_size);
    }
    ExitCode::SUCCESS
}
