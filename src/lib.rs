pub mod api;
pub mod cli;
pub mod config;
pub mod guard;
pub mod session;
pub mod tasks;
#[cfg(feature = "tui")]
pub mod tui;
