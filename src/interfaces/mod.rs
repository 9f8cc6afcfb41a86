//! Interfaces layer: the shells that feed queries into the pipeline and show
//! its results.

pub mod cli;
#[cfg(feature = "http-service")]
pub mod http;
