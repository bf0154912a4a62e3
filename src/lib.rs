pub mod analyzer;
pub mod attribution;
pub mod boundary;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod git;
pub mod orchestration;
pub mod resolver;
pub mod ui;
pub mod validation;

pub use config::{load_config, Config};
pub use error::{GotaggerError, Result};
pub use resolver::Gotagger;
