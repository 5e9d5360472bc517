mod server;
mod tracing_setup;

use anyhow::Result;
use clap::{Parser, Subcommand};

use server::{MigrateArgs, ServeArgs};
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "threads",
    author,
    version,
    about = "Threads data service: profiles, posts, replies and the feed"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Create tables and indexes, then exit
    Migrate(MigrateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_setup::init_tracing(&TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => server::run_serve(args).await?,
        Commands::Migrate(args) => server::run_migrate(args).await?,
    }
    Ok(())
}
