//! Core types shared across the sketchdrop workspace: configuration and
//! domain models. No I/O happens here.

pub mod config;
pub mod models;

pub use config::Config;
