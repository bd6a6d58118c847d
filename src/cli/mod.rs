//! CLI command implementations
//!
//! - `repack`: match two record types and print the mapping
//! - `config`: JSON schema output
//! - `util`: shared argument and output helpers

pub mod config;
pub mod repack;
pub mod util;

pub use self::config::cmd_schema;
pub use self::repack::cmd_repack;
