//! `oclc`: compile and run a single OCL source file.

use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

#[derive(ClapParser)]
#[command(name = "oclc")]
#[command(about = "OCL compiler and VM - run a single .ocl source file", long_about = None)]
struct Cli {
    /// Source file to compile and run
    source: PathBuf,

    /// Print elapsed execution time to stderr after the program finishes
    #[arg(long)]
    time: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ocl_cli=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = ocl_cli::run_file(&cli.source, cli.time);
    process::exit(code);
}
