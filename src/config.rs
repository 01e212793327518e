//! Command-line and environment configuration for the server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::db::{CrmDb, DbError};

/// Path value that selects a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// KAS CRM backend server
#[derive(Parser, Debug, Clone)]
#[command(name = "kascrm")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// SQLite database file (`:memory:` for a scratch database).
    /// Defaults to `~/.kascrm/kascrm.db`.
    #[arg(long, env = "KASCRM_DB")]
    pub db_path: Option<PathBuf>,

    /// Directory holding the quotation template images
    #[arg(long, env = "KASCRM_TEMPLATES")]
    pub templates_dir: Option<PathBuf>,

    /// Do not create the default staff accounts on start-up
    #[arg(long)]
    pub skip_seed: bool,
}

impl Args {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn open_db(&self) -> Result<CrmDb, DbError> {
        match &self.db_path {
            Some(path) if path.as_os_str() == IN_MEMORY => CrmDb::open_in_memory(),
            Some(path) => CrmDb::open_at(path.clone()),
            None => CrmDb::open(),
        }
    }
}
