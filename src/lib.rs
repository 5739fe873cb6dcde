pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod settings;
pub mod setup;
pub mod subsystem;
