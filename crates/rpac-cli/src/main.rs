//! Operator tool for an RFID power access station.
//!
//! Registers credentials by reading them off the enclosure reader, manages
//! the local authorization store and prints the default controller
//! configuration.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rpac_core::{ControllerConfig, EquipmentId, Token};
use rpac_hardware::{LatchedOutput, SerialByteSource};
use rpac_rfid::RfidReader;
use rpac_storage::{
    AuthLogRepository, AuthorizationRepository, Database, DatabaseConfig,
    SqliteAuthLogRepository, SqliteAuthorizationRepository,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rpac", version, about = "RFID power access controller tools")]
struct Cli {
    /// Controller configuration file (JSON); built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read one credential from the reader and print it
    ReadToken {
        /// Serial device of the reader
        #[arg(long)]
        port: Option<String>,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Allow a credential to power the equipment
    Grant(TokenArgs),

    /// Withdraw a credential's permission
    Revoke(TokenArgs),

    /// Show whether a credential may power the equipment
    Check(TokenArgs),

    /// Print recent authentication attempts
    Log {
        #[command(flatten)]
        store: StoreArgs,

        /// Number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Print the default configuration as JSON
    DefaultConfig,
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Equipment id; the configured one when omitted
    #[arg(long)]
    equipment: Option<EquipmentId>,

    /// Authorization database path
    #[arg(long)]
    db: Option<String>,
}

#[derive(Debug, Args)]
struct TokenArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Ten character credential
    #[arg(long)]
    token: Token,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ControllerConfig::default(),
    };

    match cli.command {
        Command::ReadToken { port, timeout_ms } => {
            let port = port.unwrap_or_else(|| config.serial.port.clone());
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.read_timeout());
            read_token(&config, &port, timeout).await
        }
        Command::Grant(args) => {
            let (equipment, authorizations, _) = open_store(&config, &args.store).await?;
            authorizations.grant(equipment, &args.token).await?;
            println!("granted {} on equipment {}", args.token, equipment);
            Ok(())
        }
        Command::Revoke(args) => {
            let (equipment, authorizations, _) = open_store(&config, &args.store).await?;
            if authorizations.revoke(equipment, &args.token).await? {
                println!("revoked {} on equipment {}", args.token, equipment);
            } else {
                println!("{} had no active permission on equipment {}", args.token, equipment);
            }
            Ok(())
        }
        Command::Check(args) => {
            let (equipment, authorizations, _) = open_store(&config, &args.store).await?;
            let allowed = authorizations.is_authorized(equipment, &args.token).await?;
            println!("{}", if allowed { "authorized" } else { "not authorized" });
            Ok(())
        }
        Command::Log { store, limit } => {
            if limit <= 0 {
                bail!("--limit must be positive, got {limit}");
            }
            let (equipment, _, log) = open_store(&config, &store).await?;
            for entry in log.recent(equipment, limit).await? {
                let outcome = entry
                    .get_outcome()
                    .map(|o| o.to_string())
                    .unwrap_or_else(|| format!("unknown({})", entry.outcome));
                match &entry.detail {
                    Some(detail) => println!(
                        "{}  {:<8} {}  {}",
                        entry.timestamp.to_rfc3339(),
                        outcome,
                        entry.token,
                        detail
                    ),
                    None => println!(
                        "{}  {:<8} {}",
                        entry.timestamp.to_rfc3339(),
                        outcome,
                        entry.token
                    ),
                }
            }
            Ok(())
        }
        Command::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&ControllerConfig::default())?);
            Ok(())
        }
    }
}

/// Registration read: reader power is hard-wired on the bench station.
async fn read_token(config: &ControllerConfig, port: &str, timeout: Duration) -> Result<()> {
    let source = SerialByteSource::open(port, config.serial.baud_rate)
        .with_context(|| format!("opening reader on {port}"))?;
    let mut reader = RfidReader::new(source, LatchedOutput::new(true))
        .with_poll_interval(config.read_poll_interval());

    info!("Present a credential to the reader on {}", port);
    let token = reader.read_token(timeout, || false).await?;
    println!("{token}");
    Ok(())
}

async fn open_store(
    config: &ControllerConfig,
    args: &StoreArgs,
) -> Result<(EquipmentId, SqliteAuthorizationRepository, SqliteAuthLogRepository)> {
    let equipment = args.equipment.unwrap_or(config.equipment_id);
    let db_config = args
        .db
        .as_deref()
        .map(DatabaseConfig::new)
        .unwrap_or_default();
    debug!("Using authorization store {}", db_config.database_path);

    let db = Database::new(db_config)
        .await
        .context("opening authorization store")?;
    let pool = db.pool().clone();
    Ok((
        equipment,
        SqliteAuthorizationRepository::new(pool.clone()),
        SqliteAuthLogRepository::new(pool),
    ))
}
