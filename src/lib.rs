pub mod auth;
pub mod common_scraper;
pub mod config;
pub mod criteria;
pub mod debug;
pub mod fetch;
pub mod models;
pub mod parser;
pub mod query;
pub mod sheets;
pub mod sink;
pub mod tui;
