//! HTTP client module

pub mod client;
pub mod deployments;
