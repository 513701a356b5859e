//! Variable specs.

use crate::Pipeline;
use std::fmt;

/// The default of a variable: a literal raw string, or a deferred
/// computation evaluated each time the schema is read.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(String),
    Deferred { compute: fn(&str) -> String, arg: String },
}

impl DefaultValue {
    pub fn deferred(compute: fn(&str) -> String, arg: impl Into<String>) -> Self {
        DefaultValue::Deferred {
            compute,
            arg: arg.into(),
        }
    }

    /// Produce the raw default. Deferred values are recomputed on every call.
    pub fn evaluate(&self) -> String {
        match self {
            DefaultValue::Literal(raw) => raw.clone(),
            DefaultValue::Deferred { compute, arg } => compute(arg),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, DefaultValue::Deferred { .. })
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(raw) => f.debug_tuple("Literal").field(raw).finish(),
            DefaultValue::Deferred { arg, .. } => {
                f.debug_struct("Deferred").field("arg", arg).finish()
            }
        }
    }
}

impl From<&str> for DefaultValue {
    fn from(raw: &str) -> Self {
        DefaultValue::Literal(raw.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(raw: String) -> Self {
        DefaultValue::Literal(raw)
    }
}

/// Declarative description of one configuration variable.
#[derive(Debug, Clone)]
pub struct VarSpec {
    pub name: String,
    pub default: Option<DefaultValue>,
    pub required: bool,
    pub pipeline: Option<Pipeline>,
    /// Variables that must be resolved before this one.
    pub after: Vec<String>,
}

impl VarSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            required: false,
            pipeline: None,
            after: Vec::new(),
        }
    }

    pub fn default_value(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn deferred_default(mut self, compute: fn(&str) -> String, arg: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::deferred(compute, arg));
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.after.push(name.into());
        self
    }

    /// All variables this one must be resolved after: explicit `after`
    /// entries plus whatever the pipeline's validator reads.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.after.iter().map(String::as_str).chain(
            self.pipeline
                .iter()
                .flat_map(|p| p.required_variables().iter().map(String::as_str)),
        )
    }
}
