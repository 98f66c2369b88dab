//! CLI command implementations.

pub mod check;
pub mod parsers;
pub mod run;
pub mod version;
