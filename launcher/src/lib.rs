pub mod aws;
mod common;
pub mod error;
pub mod identity;
pub mod job_files;
mod launch;
pub mod options;
pub mod request;
pub mod service;
pub mod spec;
pub mod strategy;

pub use error::LaunchError;
pub use launch::*;
pub use options::LaunchOptions;
