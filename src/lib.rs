pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod server;
pub mod service;
pub mod session;

pub use error::{Error, Result};
