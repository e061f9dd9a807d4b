//! Persistence module split across logical submodules.

mod books;
mod connection;
mod store;

pub use connection::default_db_path;
pub use store::BookStore;
