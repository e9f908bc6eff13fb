pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod history;
pub mod sync;
pub mod ui;
pub mod warnings;

pub use error::{ReleaseError, Result};
