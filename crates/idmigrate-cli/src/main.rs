//! idmigrate CLI
//!
//! Command-line entry point for the Clerk to WorkOS migration job

use clap::{Parser, Subcommand, ValueEnum};
use idmigrate_core::logging_facility::{self, Profile};

mod commands;
mod settings;

#[derive(Debug, Parser)]
#[command(name = "idmigrate")]
#[command(
    about = "Migrate users, organizations and memberships from Clerk to WorkOS",
    long_about = None
)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn profile(self) -> Profile {
        match self {
            LogFormat::Pretty => Profile::Development,
            LogFormat::Json => Profile::Production,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the migration cycle
    Run(commands::run::RunArgs),
    /// Resolve configuration and check the credential pair without network access
    Check(settings::SettingsArgs),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging_facility::init(cli.log_format.profile());

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Check(args) => commands::check::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
