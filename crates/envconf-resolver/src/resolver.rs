//! Resolver - resolves schema variables against an environment snapshot.

use crate::Environment;
use envconf_core::{Error, ResolvedConfig, Result, Schema, Source, Value, VarSpec};
use tracing::{debug, info, warn};

/// State of a resolution run: the configuration resolved so far and the
/// required variables that had no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub config: ResolvedConfig,
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Turn missing required variables into one aggregated error.
    pub fn into_result(self) -> Result<ResolvedConfig> {
        if self.missing.is_empty() {
            Ok(self.config)
        } else {
            Err(Error::MissingRequired(self.missing))
        }
    }
}

/// Resolves every variable of a schema, in resolution order.
pub struct Resolver<'a> {
    schema: &'a Schema,
}

impl<'a> Resolver<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Resolve all variables.
    ///
    /// Conversion, validation and authoring errors abort immediately.
    /// Missing required variables are collected into
    /// [`Resolution::missing`] instead, so the caller can report all of
    /// them at once.
    pub fn run(&self, env: &Environment) -> Result<Resolution> {
        let mut state = Resolution::default();

        for spec in self.schema.resolution_order() {
            self.resolve_var(spec, env, &mut state)?;
        }

        info!(
            resolved = state.config.len(),
            missing = state.missing.len(),
            "Configuration resolved"
        );
        Ok(state)
    }

    fn resolve_var(&self, spec: &VarSpec, env: &Environment, state: &mut Resolution) -> Result<()> {
        let name = spec.name.as_str();

        let (raw, source) = if let Some(value) = env.get(name) {
            (value.to_string(), Source::Environment)
        } else if let Some(default) = self.schema.default_of(name)? {
            (default, Source::Default)
        } else if spec.required {
            warn!(variable = %name, "Required variable not set");
            state.missing.push(name.to_string());
            return Ok(());
        } else if spec.pipeline.is_some() {
            return Err(Error::SchemaAuthoring {
                variable: name.to_string(),
                reason: "variable not set in environment, and has no default or required value"
                    .to_string(),
            });
        } else {
            debug!(variable = %name, "Optional variable not set");
            return Ok(());
        };

        let value = match &spec.pipeline {
            None => Value::Str(raw),
            Some(pipeline) => {
                let unresolved: Vec<&String> = pipeline
                    .required_variables()
                    .iter()
                    .filter(|dep| state.missing.contains(*dep))
                    .collect();
                if !unresolved.is_empty() {
                    debug!(
                        variable = %name,
                        ?unresolved,
                        "Skipping pipeline due to missing dependencies"
                    );
                    return Ok(());
                }

                let value = pipeline.convert(&raw).map_err(|reason| Error::Conversion {
                    variable: name.to_string(),
                    converter: pipeline.converter().to_string(),
                    reason,
                })?;

                if !pipeline.check(&value, &state.config) {
                    let message = pipeline
                        .error_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            format!("Unexpected conversion for variable '{}'", name)
                        });
                    return Err(Error::Validation {
                        variable: name.to_string(),
                        message,
                    });
                }
                value
            }
        };

        debug!(variable = %name, ?source, "Resolved variable");
        state.config.insert(name, value, source)
    }
}

/// Resolve `schema` against `env`, failing with one aggregated
/// [`Error::MissingRequired`] if any required variable has no value.
pub fn resolve(schema: &Schema, env: &Environment) -> Result<ResolvedConfig> {
    Resolver::new(schema).run(env)?.into_result()
}
