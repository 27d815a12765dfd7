use clap::Parser;
use miette::Result;
use pxdetect::cli::{Cli, Commands};
use pxdetect::output::Printer;
use tracing::Level;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let printer = Printer::new().with_verbose(cli.verbose);

    match cli.command {
        Commands::Detect(args) => pxdetect::cli::detect::run(args, &printer)?,
        Commands::Segment(args) => {
            pxdetect::cli::segment::run(args, &printer)?;
        }
        Commands::Slice(args) => {
            pxdetect::cli::slice::run(args, &printer)?;
        }
        Commands::Completions(args) => pxdetect::cli::completions::run(args)?,
    }

    Ok(())
}
