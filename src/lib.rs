pub mod aggregate;
pub mod charts;
pub mod classify;
pub mod config;
pub mod data;
pub mod error;
pub mod join;
pub mod pipeline;
pub mod render;
pub mod sampling;
pub mod server;
pub mod types;
