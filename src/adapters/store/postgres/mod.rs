//! PostgreSQL store backend

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgresAdapter;
pub use client::PostgresClient;
