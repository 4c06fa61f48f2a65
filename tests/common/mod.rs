//! Common test utilities for nzb-direct-search integration tests

#[allow(dead_code)]
pub mod config;
#[allow(dead_code)]
pub mod events;
#[allow(dead_code)]
pub mod server;

#[allow(unused_imports)]
pub use config::*;
#[allow(unused_imports)]
pub use events::*;
#[allow(unused_imports)]
pub use server::*;
