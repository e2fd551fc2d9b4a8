//! # Jeason Binary
//!
//! Entry point: parse the command line, set up logging, dispatch.

use clap::Parser;
use jeason::cli::{Cli, CliError, Commands, cmd_create_admin, cmd_init, cmd_serve, cmd_status};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => cmd_serve(&args).await,
        Commands::Init { database, force } => cmd_init(&database, force),
        Commands::CreateAdmin {
            database,
            email,
            password,
        } => {
            let account = cmd_create_admin(&database, &email, password.as_deref())?;
            println!("Created admin {} (id {})", account.email, account.id);
            Ok(())
        }
        Commands::Status { database, json } => {
            print!("{}", cmd_status(&database, json)?);
            Ok(())
        }
    }
}
