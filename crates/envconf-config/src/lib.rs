//! Schema definitions for envconf.
//!
//! This crate handles:
//! - Parsing schemas from KDL documents
//! - The built-in web application settings schema
//! - A typed view over resolved web settings

pub mod error;
pub mod schema;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use schema::{load_schema, parse_schema};
pub use settings::{DatabaseSettings, WebSettings, web_schema};
