use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::application::RecordService;

mod logging;
mod server;

pub use logging::{LogFormat, init_logging};

/// Cropchain - agricultural supply chain records and crop provenance ledger
#[derive(Parser)]
#[command(name = "cropchain")]
#[command(about = "Supply chain record store and crop token ledger gateway")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "DATABASE_PATH", default_value = "supply_chain.db", global = true)]
    pub database: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Auto, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and its tables
    Init,

    /// Delete every record from every table
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Run an HTTP service
    #[command(subcommand)]
    Serve(ServeCommands),
}

#[derive(Subcommand)]
pub enum ServeCommands {
    /// Serve the supply chain record store
    Records {
        /// Address to listen on
        #[arg(long, env = "RECORDS_LISTEN", default_value = "127.0.0.1:5000")]
        listen: SocketAddr,
    },

    /// Serve the crop token ledger gateway
    Ledger {
        /// Address to listen on
        #[arg(long, env = "LEDGER_LISTEN", default_value = "0.0.0.0:5000")]
        listen: SocketAddr,

        /// JSON-RPC endpoint of the ledger node
        #[arg(long, env = "RPC_URL", default_value = "http://localhost:8545")]
        rpc_url: String,

        /// Address of the deployed crop registry contract
        #[arg(long, env = "CONTRACT_ADDRESS")]
        contract_address: String,

        /// Hex private key used to sign transactions (read-only if omitted)
        #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
        private_key: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.log_format);

        match self.command {
            Commands::Init => {
                RecordService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Reset { yes } => {
                if !yes {
                    anyhow::bail!("Refusing to delete all records without --yes");
                }
                let service = RecordService::init(&self.database).await?;
                service.clear_all().await?;
                println!("All records deleted from {}", self.database);
            }

            Commands::Serve(ServeCommands::Records { listen }) => {
                server::serve_records(&self.database, listen).await?;
            }

            Commands::Serve(ServeCommands::Ledger {
                listen,
                rpc_url,
                contract_address,
                private_key,
            }) => {
                server::serve_ledger(
                    listen,
                    &rpc_url,
                    &contract_address,
                    private_key.as_deref(),
                )
                .await?;
            }
        }

        Ok(())
    }
}
