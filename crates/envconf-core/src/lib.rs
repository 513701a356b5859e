//! Core types for the envconf configuration resolver.
//!
//! This crate contains:
//! - Typed values and the literal expression parser
//! - Parser pipelines (convert, validate, message)
//! - Variable specs and lazily computed defaults
//! - The schema registry and its resolution order
//! - The resolved configuration

pub mod error;
pub mod literal;
pub mod pipeline;
pub mod resolved;
pub mod schema;
pub mod spec;
pub mod value;

pub use error::{Error, Result};
pub use pipeline::{Converter, Pipeline};
pub use resolved::{ResolvedConfig, Source};
pub use schema::{Schema, SchemaBuilder};
pub use spec::{DefaultValue, VarSpec};
pub use value::Value;
