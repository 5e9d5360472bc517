use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use reqwest::Url;
use threads_server::config::{DEFAULT_MAX_CONNECTIONS, DEFAULT_OP_TIMEOUT};
use threads_server::db::{migrations, Connector};
use threads_server::http::{run_server, ServerConfig};
use threads_server::revalidate::{LogRevalidator, Revalidator, WebhookRevalidator};
use threads_server::{AppState, StoreConfig};

/// Store connection options shared by `serve` and `migrate`
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Postgres connection string (in-process store when unset)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long, env = "THREADS_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Bound on each store operation, in milliseconds
    #[arg(long, env = "THREADS_STORE_TIMEOUT_MS", default_value_t = DEFAULT_OP_TIMEOUT.as_millis() as u64)]
    pub store_timeout_ms: u64,
}

impl StoreArgs {
    fn config(&self) -> StoreConfig {
        StoreConfig {
            database_url: self
                .database_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
            max_connections: self.max_connections,
            op_timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to
    #[arg(long, env = "THREADS_BIND", default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Port to bind the HTTP server to
    #[arg(long, env = "THREADS_PORT", default_value_t = 3030)]
    pub port: u16,

    /// Allow cross-origin requests from any origin
    #[arg(long)]
    pub cors_permissive: bool,

    /// Endpoint receiving `{"path": ...}` after every mutation
    #[arg(long, env = "THREADS_REVALIDATE_URL")]
    pub revalidate_url: Option<Url>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let revalidator: Arc<dyn Revalidator> = match args.revalidate_url {
        Some(url) => {
            tracing::info!(endpoint = %url, "Revalidation webhook enabled");
            Arc::new(
                WebhookRevalidator::new(url, Duration::from_secs(5))
                    .context("failed to build revalidation client")?,
            )
        }
        None => Arc::new(LogRevalidator),
    };

    let state = AppState::from_config(&args.store.config(), revalidator)
        .await
        .context("failed to initialise store")?;

    let config = ServerConfig {
        bind_addr: SocketAddr::new(args.bind, args.port),
        cors_permissive: args.cors_permissive,
    };
    run_server(state, config).await?;
    Ok(())
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = args.store.config();
    if config.database_url.is_none() {
        bail!("DATABASE_URL is required to run migrations");
    }

    let connector = Connector::new(&config);
    let pool = connector.connect().await.context("failed to connect")?;
    migrations::run(pool).await.context("migrations failed")?;
    connector.close().await;

    tracing::info!("Migrations complete");
    Ok(())
}
