pub mod app;
pub mod commands;
pub mod logging;

pub use app::{Cli, LogLevel};
