//! Core library surface for the book catalog web application.
//!
//! The binary wires these pieces together; integration tests drive the same
//! router against a throwaway database.
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod forms;
pub mod logging;
pub mod models;
pub mod web;

pub use controller::{Controller, Outcome, Page};
pub use db::BookStore;
pub use error::{StoreError, StoreResult};
pub use forms::{BookForm, ValidationErrors};
pub use models::{Book, NewBook};
