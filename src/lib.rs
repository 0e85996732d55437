pub mod ai;
pub mod browser;
pub mod config;
pub mod engine;
pub mod feed;
pub mod store;
pub mod tui;
pub mod update;
