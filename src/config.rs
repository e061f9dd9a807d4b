use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::db::default_db_path;

/// Serve a small book catalog over HTTP.
#[derive(Debug, Parser)]
#[command(name = "book-catalog", version, about, long_about = None)]
pub struct Config {
    /// SQLite database file (defaults to ~/.book-catalog/books.sqlite)
    #[arg(long, env = "BOOK_CATALOG_DB", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Address the HTTP server listens on
    #[arg(long, env = "BOOK_CATALOG_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,
}

impl Config {
    /// The database file to open: `--db` / `BOOK_CATALOG_DB` when given,
    /// otherwise the per-user default under the home directory.
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.db {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}
