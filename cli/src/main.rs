mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, cache, find, info, probe};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet);
    let cfg = commands.config()?;
    let quiet = commands.quiet;

    print::banner(quiet);

    match &commands.command {
        Commands::Find(args) => find::find(&cfg, args, quiet).await,
        Commands::Probe { address } => probe::probe(&cfg, address, quiet).await,
        Commands::Info => {
            info::info(&cfg, quiet)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cache => {
            cache::cache(&cfg, quiet)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
