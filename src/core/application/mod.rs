pub mod aggregator;
pub mod collector;
pub mod config;
pub mod filter;
pub mod pipeline;
pub mod render;
