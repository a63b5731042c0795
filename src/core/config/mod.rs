pub mod data;
pub mod defaults;
pub mod io;

pub use data::{Config, ModelChoice};
pub use io::ConfigError;
