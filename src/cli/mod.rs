//! CLI command handling

pub mod autostart;
pub mod config;
pub mod output;
pub mod run;
pub mod setup;

pub use autostart::*;
pub use config::*;
pub use output::*;
pub use run::*;
pub use setup::*;
