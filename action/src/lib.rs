//! Replace Deployment Library
//!
//! Supersedes the automated GitHub deployments of a commit with a new
//! deployment per environment, then retires the old ones.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod utils;
