//! Geodesy transformation service adapter

pub mod client;
pub mod models;

pub use client::{GeodesyClient, GlobalPosition};
