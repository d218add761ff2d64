//! tpac-rs library
//!
//! Command implementations behind the tpac-rs binary.

pub mod cli;
pub mod commands;
pub mod utils;
