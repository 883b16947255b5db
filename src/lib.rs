pub mod config;
pub mod models;
pub mod processing;
pub mod scanner;
pub mod utils;
pub mod validation;

pub use config::ScanConfig;
pub use scanner::PassportScanner;
pub use utils::{Result, ScanError};
