pub mod chat;
pub mod config;
pub mod logging;
pub mod runner;
