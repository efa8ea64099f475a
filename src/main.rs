use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cepquote::client::QuoteClient;
use cepquote::config::Config;
use cepquote::lookup::CepLookup;
use cepquote::server::QuoteServer;

#[derive(Parser)]
#[command(
    name = "cepquote",
    version,
    about = "Race CEP lookup APIs and serve the USD/BRL exchange rate",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a CEP, printing whichever API answers first
    Cep {
        /// Postal code, with or without the dash
        cep: String,

        /// Overall race timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Run the exchange-rate server
    Serve {
        /// Address to bind
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Fetch the quote from the server and save it to a file
    Quote {
        /// Quote server base URL
        #[arg(short, long)]
        server: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env();
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Cep { cep, timeout_ms } => {
            if let Some(ms) = timeout_ms {
                config.lookup.race_timeout_ms = ms;
                config.lookup.request_timeout_ms = config.lookup.request_timeout_ms.min(ms);
            }
            config.validate()?;

            tracing::info!(cep = %cep, timeout_ms = config.lookup.race_timeout_ms, "Starting cep command");
            cep_command(&config, &cep).await?;
        }

        Commands::Serve { bind, db } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            if let Some(db) = db {
                config.database.sqlite_path = db;
            }
            config.validate()?;

            tracing::info!(
                bind = %config.server.bind_address,
                db = %config.database.sqlite_path.display(),
                "Starting serve command"
            );
            serve_command(config).await?;
        }

        Commands::Quote { server, output } => {
            if let Some(server) = server {
                config.client.server_url = server;
            }
            if let Some(output) = output {
                config.client.output_path = output;
            }
            config.validate()?;

            tracing::info!(server = %config.client.server_url, "Starting quote command");
            quote_command(&config).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("cepquote=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("cepquote={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

async fn cep_command(config: &Config, cep: &str) -> Result<()> {
    let lookup = CepLookup::from_config(&config.lookup)?;
    let address = lookup
        .lookup(cep)
        .await
        .with_context(|| format!("No CEP API answered for {cep}"))?;

    print!("{address}");
    Ok(())
}

async fn serve_command(config: Config) -> Result<()> {
    let server = QuoteServer::new(config.server, &config.database)?;
    println!("{}", server.info().display());

    server
        .start_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    Ok(())
}

async fn quote_command(config: &Config) -> Result<()> {
    let client = QuoteClient::new(&config.client)?;
    let bid = client.run().await?;

    println!("Dollar quote saved to {}", client.output_path().display());
    println!("{}", cepquote::client::format_bid_line(&bid));
    Ok(())
}
