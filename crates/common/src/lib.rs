pub mod config;
pub mod observability;
pub mod polymarket;
pub mod types;
