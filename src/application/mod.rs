//! Application layer wiring DTOs and services for the kill-chain analyst.

pub mod dtos;
pub mod services;

pub use dtos::{AnalysisReport, AnalyzeRequest, GraphResponse, HealthStatusResponse};
pub use services::{AnalysisService, Presenter};
