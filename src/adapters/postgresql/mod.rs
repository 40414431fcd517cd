//! PostgreSQL report source
//!
//! Reads the LMS relational schema through a pooled `tokio-postgres`
//! connection.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
