use clap::Parser;
use taskgrid::cli::commands::Cli;
use taskgrid::cli::handlers;

/// Log to stderr, filtered by `TG_LOG` (or `RUST_LOG`), warnings by default
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env("TG_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
