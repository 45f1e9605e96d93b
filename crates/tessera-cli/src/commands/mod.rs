//! CLI command handlers
//!
//! # Modules
//!
//! - `info`: Capability report
//! - `bench`: Kernel-vs-reference benchmark

pub mod bench;
pub mod info;
