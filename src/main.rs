// src/main.rs

use tether::{cli, logging, run};

// The main thread is the UI thread; the Tokio runtime is built inside `run`.
fn main() {
    if let Err(err) = run_main() {
        eprintln!("tether error: {err:?}");
        std::process::exit(1);
    }
}

fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args)
}
