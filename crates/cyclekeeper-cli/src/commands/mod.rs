pub mod config;
pub mod start;
