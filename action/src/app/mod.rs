//! Action wiring: inputs, runner context, outputs

pub mod context;
pub mod options;
pub mod outputs;
pub mod run;
