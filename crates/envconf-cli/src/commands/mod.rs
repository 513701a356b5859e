//! CLI command implementations.

mod show;

pub use show::show;

use anyhow::{Context, Result};
use envconf_config::{load_schema, web_schema};
use envconf_core::Schema;
use envconf_resolver::Environment;
use std::path::PathBuf;
use tracing::debug;

/// Where the schema and environment for a command come from.
pub struct SchemaSource {
    pub schema: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
    pub overrides: Vec<(String, String)>,
}

impl SchemaSource {
    pub fn load_schema(&self) -> Result<Schema> {
        match &self.schema {
            Some(path) => load_schema(path)
                .with_context(|| format!("failed to load schema {}", path.display())),
            None => {
                let base_dir = match &self.base_dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir().context("failed to read current directory")?,
                };
                debug!(base_dir = %base_dir.display(), "Using built-in web settings schema");
                Ok(web_schema(base_dir)?)
            }
        }
    }

    /// Process environment with `--set` overrides applied.
    pub fn environment(&self) -> Environment {
        self.overrides
            .iter()
            .fold(Environment::from_process(), |env, (key, value)| {
                env.with(key.clone(), value.clone())
            })
    }
}

pub fn check(source: &SchemaSource) -> Result<()> {
    let schema = source.load_schema()?;
    match envconf_resolver::resolve(&schema, &source.environment()) {
        Ok(config) => {
            println!("Configuration is valid ({} variables)", config.len());
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

pub fn schema(source: &SchemaSource) -> Result<()> {
    let schema = source.load_schema()?;
    for spec in schema.resolution_order() {
        let mut line = spec.name.clone();
        if spec.required {
            line.push_str(" required");
        }
        if let Some(default) = schema.default_of(&spec.name)? {
            line.push_str(&format!(" default={:?}", default));
        }
        if let Some(pipeline) = &spec.pipeline {
            line.push_str(&format!(" parser={}", pipeline.converter()));
        }
        let deps: Vec<&str> = spec.dependencies().collect();
        if !deps.is_empty() {
            line.push_str(&format!(" after={}", deps.join(",")));
        }
        println!("{}", line);
    }
    Ok(())
}
