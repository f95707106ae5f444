//! Text formats read by the benchmark harness.
//!
//! - [`parse_properties`] reads dialect translation files into an
//!   order-preserving [`Properties`](dbbench_core::Properties).
//! - [`parse_targets`] turns a config-list file into one
//!   [`DatabaseTarget`](dbbench_core::DatabaseTarget) per line.
//! - [`parse_script`] splits a SQL script into statements.

pub mod error;
pub mod properties;
pub mod script;
pub mod targets;

pub use error::ParseError;
pub use properties::parse_properties;
pub use script::parse_script;
pub use targets::{config_lines, parse_targets};
