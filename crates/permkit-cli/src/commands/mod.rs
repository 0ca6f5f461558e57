//! CLI command implementations.

pub mod loginurl;
pub mod permset_create;
