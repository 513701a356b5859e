//! Resolution of envconf schemas.
//!
//! This crate handles:
//! - Environment snapshots (process environment or explicit pairs)
//! - Built-in parser pipelines (boolean, string list, URL, directory, ...)
//! - The resolver that turns a schema and an environment into a
//!   validated configuration

pub mod environment;
pub mod parsers;
pub mod resolver;

pub use environment::Environment;
pub use resolver::{Resolution, Resolver, resolve};
