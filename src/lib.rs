#[macro_use]
extern crate log;

pub mod common;
pub mod config;
pub mod models;
pub mod transport;
pub mod utils;
pub mod workflow;

pub use config::AppConfig;
pub use workflow::Workflow;
