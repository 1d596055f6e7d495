use clap::Parser;
use phdb::Opts;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let opts = Opts::parse();
    env_logger::Builder::from_default_env().init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    match phdb::run(stdin.lock(), &mut stdout.lock(), &opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
