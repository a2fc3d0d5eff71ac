//! Command implementations.

pub mod config;
pub mod extract;
pub mod show;

pub use self::config::execute_config;
pub use self::extract::execute_extract;
pub use self::show::execute_show;
