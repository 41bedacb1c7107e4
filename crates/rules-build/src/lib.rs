pub mod build;
pub mod config;
pub mod error;
pub mod metadata;
pub mod output;
