use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.parse() {
            Ok(value) => args.push(value),
            Err(_) => {
                eprintln!("invalid argument {arg:?}: expected an integer");
                return ExitCode::FAILURE;
            }
        }
    }

    let src = match read_in() {
        Ok(src) => src,
        Err(err) => {
            eprintln!("failed to read stdin: {err}");
            return ExitCode::FAILURE;
        }
    };

    match rasm_vm::eval(&src, &args) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: rasm_vm::Error) {
    match err {
        rasm_vm::Error::Parse(errors) => {
            for err in errors {
                eprintln!("parse error: {err}");
            }
        }
        rasm_vm::Error::Decode(errors) => {
            for err in errors {
                eprintln!("decode error: {err}");
            }
        }
        rasm_vm::Error::Run(err) => eprintln!("runtime error: {err}"),
    }
}

fn read_in() -> std::io::Result<String> {
    use std::io::{stdin, Read};
    let mut out = String::new();
    stdin().read_to_string(&mut out)?;
    Ok(out)
}
